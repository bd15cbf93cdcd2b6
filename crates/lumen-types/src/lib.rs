//! Semantic type values and the inference of annotated types.

mod infer;
mod operator;
mod ty;

pub use infer::{DocTypeInfer, TypeInfer};
pub use operator::{OperatorKind, TypeOperator};
pub use ty::{Param, Signature, Type};
