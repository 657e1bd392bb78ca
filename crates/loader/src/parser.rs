//! Decoding of the XML program representation into instructions.
//!
//! Operates on an already parsed document; well-formedness is checked by
//! the caller.

use crate::error::LoadError;
use ippcode_common::{Frame, Instruction, Opcode, Operand, TypeTag, Value, VarRef};
use roxmltree::{Document, Node};
use std::collections::HashSet;

const LANGUAGE: &str = "IPPcode22";
const ROOT_ATTRIBUTES: [&str; 3] = ["language", "name", "description"];

/// Characters allowed in identifiers besides ASCII letters and digits.
const IDENT_SPECIALS: &str = "_-$&%*!?";

/// Decode every `instruction` element of the document, in document order.
pub(crate) fn parse_document(doc: &Document<'_>) -> Result<Vec<Instruction>, LoadError> {
    let root = doc.root_element();
    check_root(root)?;

    let mut seen = HashSet::new();
    let mut instructions = Vec::new();
    for child in element_children(root, "program")? {
        if child.tag_name().name() != "instruction" {
            return Err(LoadError::UnexpectedContent {
                context: "program".to_string(),
                found: child.tag_name().name().to_string(),
            });
        }
        let instr = parse_instruction(child)?;
        if !seen.insert(instr.order) {
            return Err(LoadError::DuplicateOrder { order: instr.order });
        }
        instructions.push(instr);
    }
    Ok(instructions)
}

fn check_root(root: Node<'_, '_>) -> Result<(), LoadError> {
    if root.tag_name().name() != "program" {
        return Err(LoadError::InvalidRoot {
            reason: format!("root element is '{}'", root.tag_name().name()),
        });
    }
    for attr in root.attributes() {
        if !ROOT_ATTRIBUTES.contains(&attr.name()) {
            return Err(LoadError::InvalidRoot {
                reason: format!("unexpected attribute '{}'", attr.name()),
            });
        }
    }
    match root.attribute("language") {
        Some(lang) if lang.eq_ignore_ascii_case(LANGUAGE) => Ok(()),
        Some(lang) => Err(LoadError::InvalidRoot {
            reason: format!("unsupported language '{lang}'"),
        }),
        None => Err(LoadError::MissingAttribute {
            element: "program".to_string(),
            attribute: "language",
        }),
    }
}

/// Element children of `node`. Whitespace text, comments and processing
/// instructions are skipped; any other text is rejected.
fn element_children<'a, 'i>(
    node: Node<'a, 'i>,
    context: &str,
) -> Result<Vec<Node<'a, 'i>>, LoadError> {
    let mut elements = Vec::new();
    for child in node.children() {
        if child.is_element() {
            elements.push(child);
        } else if child.is_text() {
            let text = child.text().unwrap_or("");
            if !text.trim().is_empty() {
                return Err(LoadError::UnexpectedContent {
                    context: context.to_string(),
                    found: text.trim().to_string(),
                });
            }
        }
    }
    Ok(elements)
}

fn parse_instruction(node: Node<'_, '_>) -> Result<Instruction, LoadError> {
    let order_text = node
        .attribute("order")
        .ok_or_else(|| missing("instruction", "order"))?;
    let order = match order_text.trim().parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(LoadError::InvalidOrder {
                value: order_text.to_string(),
            })
        }
    };

    let mnemonic = node
        .attribute("opcode")
        .ok_or_else(|| missing("instruction", "opcode"))?;
    let opcode = Opcode::from_mnemonic(mnemonic.trim()).ok_or_else(|| LoadError::UnknownOpcode {
        order,
        mnemonic: mnemonic.to_string(),
    })?;

    let arity = opcode.arity();
    let mut slots: Vec<Option<Operand>> = vec![None; arity];
    for arg in element_children(node, "instruction")? {
        let name = arg.tag_name().name();
        let slot = name
            .strip_prefix("arg")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| (1..=arity).contains(n))
            .ok_or_else(|| {
                LoadError::operand(order, format!("unexpected element '{name}' for {opcode}"))
            })?;
        if slots[slot - 1].is_some() {
            return Err(LoadError::operand(order, format!("duplicate {name}")));
        }
        slots[slot - 1] = Some(parse_operand(arg, order)?);
    }

    let operands = slots
        .into_iter()
        .enumerate()
        .map(|(i, operand)| {
            operand.ok_or_else(|| LoadError::operand(order, format!("missing arg{}", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instruction::new(opcode, operands).with_order(order))
}

fn parse_operand(arg: Node<'_, '_>, order: u64) -> Result<Operand, LoadError> {
    let ty = arg
        .attribute("type")
        .ok_or_else(|| missing(arg.tag_name().name(), "type"))?;
    let raw = arg.text().unwrap_or("");
    let text = raw.trim();

    match ty {
        "var" => parse_var(text)
            .map(Operand::Var)
            .ok_or_else(|| LoadError::operand(order, format!("invalid variable '{text}'"))),
        "label" if is_identifier(text) => Ok(Operand::Label(text.to_string())),
        "label" => Err(LoadError::operand(order, format!("invalid label '{text}'"))),
        "type" => TypeTag::from_name(text)
            .filter(TypeTag::is_readable)
            .map(Operand::Type)
            .ok_or_else(|| LoadError::operand(order, format!("invalid type '{text}'"))),
        "int" => text
            .parse::<i64>()
            .map(|n| Operand::Literal(Value::Int(n)))
            .map_err(|_| LoadError::operand(order, format!("invalid int literal '{text}'"))),
        "bool" => match text {
            "true" => Ok(Operand::Literal(Value::Bool(true))),
            "false" => Ok(Operand::Literal(Value::Bool(false))),
            _ => Err(LoadError::operand(order, format!("invalid bool literal '{text}'"))),
        },
        "nil" if text == "nil" => Ok(Operand::Literal(Value::Nil)),
        "nil" => Err(LoadError::operand(order, format!("invalid nil literal '{text}'"))),
        "string" => decode_string(raw)
            .map(|s| Operand::Literal(Value::Str(s)))
            .ok_or_else(|| LoadError::operand(order, format!("invalid escape in '{raw}'"))),
        other => Err(LoadError::operand(order, format!("unknown operand type '{other}'"))),
    }
}

fn missing(element: &str, attribute: &'static str) -> LoadError {
    LoadError::MissingAttribute {
        element: element.to_string(),
        attribute,
    }
}

/// Parse `GF@name`, `LF@name` or `TF@name`.
pub(crate) fn parse_var(text: &str) -> Option<VarRef> {
    let (prefix, name) = text.split_once('@')?;
    let frame = Frame::from_prefix(prefix)?;
    is_identifier(name).then(|| VarRef::new(frame, name))
}

/// Variable and label names: a letter or special character followed by
/// letters, digits and special characters.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let allowed = |c: char| c.is_ascii_alphanumeric() || IDENT_SPECIALS.contains(c);
    !first.is_ascii_digit() && allowed(first) && chars.all(allowed)
}

/// Decode `\ddd` escapes (exactly three decimal digits) into characters.
/// Returns `None` for a backslash not followed by three digits.
pub fn decode_string(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut code = 0u32;
        for _ in 0..3 {
            code = code * 10 + chars.next()?.to_digit(10)?;
        }
        out.push(char::from_u32(code)?);
    }
    Some(out)
}
