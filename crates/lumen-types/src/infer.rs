use std::sync::Arc;

use lumen_tree::{node::DocType, tree::SyntaxTree};

use crate::{Param, Signature, Type};

/// Turns a type annotation into a type value.
///
/// Implementations are pure and total: the same node always yields an equal
/// type, and syntax they do not understand becomes [`Type::Unknown`].
pub trait TypeInfer: Send + Sync {
    fn infer(&self, ty: DocType, tree: &SyntaxTree) -> Type;

    fn infer_opt(&self, ty: Option<DocType>, tree: &SyntaxTree) -> Type {
        ty.map_or(Type::Unknown, |ty| self.infer(ty, tree))
    }
}

/// Maps builtin names onto primitive types and every other name onto a
/// nominal type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocTypeInfer;

impl DocTypeInfer {
    pub fn builtin(name: &str) -> Option<Type> {
        let ty = match name {
            "unknown" => Type::Unknown,
            "nil" | "void" => Type::Nil,
            "any" => Type::Any,
            "boolean" | "bool" => Type::Boolean,
            "integer" | "int" => Type::Integer,
            "number" => Type::Number,
            "string" => Type::String,
            "table" => Type::Table,
            "function" => Type::Function,
            _ => return None,
        };

        Some(ty)
    }
}

impl TypeInfer for DocTypeInfer {
    fn infer(&self, ty: DocType, tree: &SyntaxTree) -> Type {
        match ty {
            DocType::Name(id) => {
                let name = &tree.node(id).name;
                Self::builtin(name).unwrap_or_else(|| Type::Named(name.clone()))
            }
            DocType::Array(id) => {
                let elem = self.infer_opt(tree.node(id).elem, tree);
                Type::Array(Box::new(elem))
            }
            DocType::Union(id) => tree
                .node(id)
                .types
                .iter()
                .map(|&ty| self.infer(ty, tree))
                .fold(Type::Unknown, Type::union),
            DocType::Func(id) => {
                let func = tree.node(id);

                let params = func
                    .params
                    .iter()
                    .filter_map(|&param| {
                        let param = tree.node(param);
                        let name = &tree.node(param.name?).text;

                        let mut ty = self.infer_opt(param.ty, tree);
                        if param.nullable {
                            ty = ty.nullable();
                        }

                        Some(Param::new(name.clone(), ty))
                    })
                    .collect();

                let returns = func
                    .returns
                    .iter()
                    .map(|&ty| self.infer(ty, tree))
                    .collect();

                Type::Signature(Arc::new(Signature::new(params, returns)))
            }
            DocType::Table(id) => Type::TableLiteral(tree.syntax_id(id)),
            DocType::Generic(id) => {
                let generic = tree.node(id);

                Type::GenericApp {
                    name: tree.node(generic.name).name.clone(),
                    args: generic.args.iter().map(|&ty| self.infer(ty, tree)).collect(),
                }
            }
        }
    }
}
