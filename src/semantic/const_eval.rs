use crate::ast::{Node, NodeKind};

/// Folds number literals, unary `+`/`-` and binary `+ - * / %`.
///
/// Division or remainder by zero does not fold, so a nested `1 / 0` never
/// turns into an infinity that hides the outer expression.
pub fn fold(node: &Node) -> Option<f64> {
    match node.kind {
        NodeKind::NumberLiteral => node.value()?.parse().ok(),
        NodeKind::UnaryExpression => {
            let operand = fold(node.child(0)?)?;
            match node.value()? {
                "+" => Some(operand),
                "-" => Some(-operand),
                _ => None,
            }
        }
        NodeKind::BinaryExpression => {
            let left = fold(node.child(0)?)?;
            let right = fold(node.child(1)?)?;
            match node.value()? {
                "+" => Some(left + right),
                "-" => Some(left - right),
                "*" => Some(left * right),
                "/" if right != 0.0 => Some(left / right),
                "%" if right != 0.0 => Some(left % right),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn is_constant_zero(node: &Node) -> bool {
    fold(node) == Some(0.0)
}
