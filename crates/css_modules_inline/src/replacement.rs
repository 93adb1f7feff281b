use swc_core::common::{Span, SyntaxContext};
use swc_core::ecma::ast::*;

use crate::stylesheet::ClassNameMapping;

fn string_literal(value: &str, span: Span) -> Str {
  Str {
    span,
    value: value.into(),
    raw: None,
  }
}

/// `{ "local": "generated", ... }` in mapping order, every node spanning `span`.
pub fn class_names_object(mapping: &ClassNameMapping, span: Span) -> ObjectLit {
  let props = mapping
    .iter()
    .map(|(local, generated)| {
      PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
        key: PropName::Str(string_literal(local, span)),
        value: Box::new(Expr::Lit(Lit::Str(string_literal(generated, span)))),
      })))
    })
    .collect();

  ObjectLit { span, props }
}

/// `var <local> = <object>;`
///
/// `local` keeps its syntax context so existing references still bind to it.
pub fn namespace_binding(local: Ident, object: ObjectLit, span: Span) -> Stmt {
  Stmt::Decl(Decl::Var(Box::new(VarDecl {
    span,
    ctxt: SyntaxContext::empty(),
    kind: VarDeclKind::Var,
    declare: false,
    decls: vec![VarDeclarator {
      span,
      name: Pat::Ident(BindingIdent {
        id: local,
        type_ann: None,
      }),
      init: Some(Box::new(Expr::Object(object))),
      definite: false,
    }],
  })))
}
