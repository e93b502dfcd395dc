use super::{Instruction, Operand};

pub const OPERAND_BITS: u32 = 24;

const OPERAND_MODULUS: f64 = (1u32 << OPERAND_BITS) as f64;

/// 24-bit operand field. Numbers are truncated and wrapped, so negatives come
/// out in two's complement; non-finite numbers encode as zero.
fn operand_bits(operand: &Operand) -> u32 {
    match operand {
        Operand::None => 0,
        Operand::Number { value, .. } if value.is_finite() => {
            value.trunc().rem_euclid(OPERAND_MODULUS) as u32
        }
        Operand::Number { .. } => 0,
        Operand::Symbol { id, .. } => *id & ((1 << OPERAND_BITS) - 1),
    }
}

/// `"<8-bit opcode> <24-bit operand>"` for a single instruction.
pub fn encode(instruction: &Instruction) -> String {
    format!(
        "{:08b} {:024b}",
        instruction.opcode.code(),
        operand_bits(&instruction.operand)
    )
}

pub fn to_binary(instructions: &[Instruction]) -> Vec<String> {
    instructions.iter().map(encode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Opcode, lower};
    use crate::parser::parse;

    #[test]
    fn encodes_declaration() {
        let program = parse("let x = 5 + 2 * 3;").program;
        assert_eq!(
            to_binary(&lower(&program)),
            vec![
                "00000001 000000000000000000000101",
                "00000001 000000000000000000000010",
                "00000001 000000000000000000000011",
                "00000110 000000000000000000000000",
                "00000100 000000000000000000000000",
                "00000011 000000000000000000000001",
            ]
        );
    }

    #[test]
    fn numbers_truncate_and_wrap() {
        let encode_number = |value: f64| {
            let operand = Operand::Number {
                value,
                text: value.to_string(),
            };
            encode(&Instruction::new(Opcode::PushConst, operand))
        };
        assert_eq!(encode_number(7.9), "00000001 000000000000000000000111");
        assert_eq!(encode_number(-1.0), "00000001 111111111111111111111111");
        assert_eq!(encode_number(16_777_218.0), "00000001 000000000000000000000010");
        assert_eq!(encode_number(f64::INFINITY), "00000001 000000000000000000000000");
    }

    #[test]
    fn comments_use_the_high_opcode() {
        let program = parse("function f() {}").program;
        assert_eq!(
            to_binary(&lower(&program)),
            vec![
                "11111111 000000000000000000000001",
                "11111111 000000000000000000000010",
            ]
        );
    }
}
