//! Integration tests for the IPPcode22 XML loader.

use ippcode_common::{ErrorKind, Frame, Opcode, Operand, TypeTag, Value, VarRef};
use ippcode_loader::{decode_string, load, LoadError};
use ippcode_vm::{run, LineInput, Termination};

// ============================================================
// Helpers
// ============================================================

/// Wrap instruction elements in a program root.
fn program(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<program language=\"IPPcode22\">\n{body}\n</program>"
    )
}

fn load_err(xml: &str) -> LoadError {
    load(xml).unwrap_err()
}

/// Load and run a program, returning the termination and the standard output.
fn load_and_run(xml: &str, input: &str) -> (Termination, String) {
    let program = load(xml).unwrap();
    let mut input = LineInput::new(input.as_bytes());
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let done = run(&program, &mut input, &mut out, &mut diag).unwrap();
    (done, String::from_utf8(out).unwrap())
}

// ============================================================
// Well-formed programs
// ============================================================

#[test]
fn empty_program() {
    let program = load(&program("")).unwrap();
    assert!(program.is_empty());
}

#[test]
fn root_attributes_and_language_case() {
    let xml = r#"<program language="ippCODE22" name="demo" description="test"></program>"#;
    assert!(load(xml).is_ok());
}

#[test]
fn decodes_every_operand_type() {
    let xml = program(
        r#"<instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
<instruction order="2" opcode="READ"><arg1 type="var">GF@x</arg1><arg2 type="type">int</arg2></instruction>
<instruction order="3" opcode="JUMPIFEQ">
  <arg1 type="label">end</arg1>
  <arg2 type="bool">true</arg2>
  <arg3 type="nil">nil</arg3>
</instruction>
<instruction order="4" opcode="WRITE"><arg1 type="string">a\032&lt;b</arg1></instruction>
<instruction order="5" opcode="EXIT"><arg1 type="int">-3</arg1></instruction>
<instruction order="6" opcode="LABEL"><arg1 type="label">end</arg1></instruction>"#,
    );
    let program = load(&xml).unwrap();
    assert_eq!(program.len(), 6);
    assert_eq!(program.label("end"), Some(5));

    let ops = |i: usize| &program.get(i).unwrap().operands;
    assert_eq!(ops(0), &vec![Operand::Var(VarRef::new(Frame::Global, "x"))]);
    assert_eq!(ops(1)[1], Operand::Type(TypeTag::Int));
    assert_eq!(
        ops(2),
        &vec![
            Operand::Label("end".into()),
            Operand::Literal(Value::Bool(true)),
            Operand::Literal(Value::Nil),
        ]
    );
    assert_eq!(ops(3), &vec![Operand::Literal(Value::Str("a <b".into()))]);
    assert_eq!(ops(4), &vec![Operand::Literal(Value::Int(-3))]);
}

#[test]
fn opcode_is_case_insensitive() {
    let xml = program(r#"<instruction order="1" opcode="createFrame"/>"#);
    let program = load(&xml).unwrap();
    assert_eq!(program.get(0).unwrap().opcode, Opcode::CreateFrame);
}

#[test]
fn instructions_sorted_by_order() {
    let xml = program(
        r#"<instruction order="30" opcode="WRITE"><arg1 type="string">c</arg1></instruction>
<instruction order="2" opcode="WRITE"><arg1 type="string">a</arg1></instruction>
<instruction order="10" opcode="WRITE"><arg1 type="string">b</arg1></instruction>"#,
    );
    let orders: Vec<u64> = load(&xml)
        .unwrap()
        .instructions()
        .iter()
        .map(|instr| instr.order)
        .collect();
    assert_eq!(orders, vec![2, 10, 30]);
    let (done, out) = load_and_run(&xml, "");
    assert_eq!(done, Termination::Completed);
    assert_eq!(out, "abc");
}

#[test]
fn arguments_in_any_document_order() {
    let xml = program(
        r#"<instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@s</arg1></instruction>
<instruction order="2" opcode="CONCAT">
  <arg3 type="string">two</arg3>
  <arg1 type="var">GF@s</arg1>
  <arg2 type="string">one</arg2>
</instruction>
<instruction order="3" opcode="WRITE"><arg1 type="var">GF@s</arg1></instruction>"#,
    );
    let (_, out) = load_and_run(&xml, "");
    assert_eq!(out, "onetwo");
}

#[test]
fn empty_string_literal() {
    let xml = program(r#"<instruction order="1" opcode="WRITE"><arg1 type="string"/></instruction>"#);
    let program = load(&xml).unwrap();
    assert_eq!(
        program.get(0).unwrap().operands[0],
        Operand::Literal(Value::Str(String::new()))
    );
}

#[test]
fn string_literal_keeps_surrounding_whitespace() {
    let xml = program(
        r#"<instruction order="1" opcode="WRITE"><arg1 type="string"> a </arg1></instruction>
<instruction order="2" opcode="WRITE"><arg1 type="string">\032b\032 </arg1></instruction>
<instruction order="3" opcode="WRITE"><arg1 type="int"> 4 </arg1></instruction>"#,
    );
    let loaded = load(&xml).unwrap();
    assert_eq!(
        loaded.get(0).unwrap().operands[0],
        Operand::Literal(Value::Str(" a ".to_string()))
    );
    assert_eq!(
        loaded.get(1).unwrap().operands[0],
        Operand::Literal(Value::Str(" b  ".to_string()))
    );
    let (_, out) = load_and_run(&xml, "");
    assert_eq!(out, " a  b  4");
}

#[test]
fn comments_are_ignored() {
    let xml = program(
        r#"<!-- header -->
<instruction order="1" opcode="BREAK"><!-- no operands --></instruction>"#,
    );
    assert_eq!(load(&xml).unwrap().len(), 1);
}

#[test]
fn loaded_program_reads_input() {
    let xml = program(
        r#"<instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@n</arg1></instruction>
<instruction order="2" opcode="READ"><arg1 type="var">GF@n</arg1><arg2 type="type">int</arg2></instruction>
<instruction order="3" opcode="MUL"><arg1 type="var">GF@n</arg1><arg2 type="var">GF@n</arg2><arg3 type="int">2</arg3></instruction>
<instruction order="4" opcode="WRITE"><arg1 type="var">GF@n</arg1></instruction>
<instruction order="5" opcode="EXIT"><arg1 type="int">7</arg1></instruction>"#,
    );
    let (done, out) = load_and_run(&xml, "21\n");
    assert_eq!(done, Termination::Exit(7));
    assert_eq!(out, "42");
}

// ============================================================
// Malformed XML (31)
// ============================================================

#[test]
fn not_well_formed() {
    for xml in ["", "<program language=\"IPPcode22\">", "<program></prog>", "just text"] {
        let err = load_err(xml);
        assert!(matches!(err, LoadError::MalformedXml { .. }), "{xml:?} gave {err:?}");
        assert_eq!(err.kind().exit_code(), 31);
    }
}

// ============================================================
// Unexpected structure (32)
// ============================================================

fn assert_structure_error(xml: &str) {
    let err = load_err(xml);
    assert_eq!(
        err.kind(),
        ErrorKind::UnexpectedStructure,
        "{xml} gave {err:?}"
    );
}

#[test]
fn bad_root() {
    assert_structure_error(r#"<prog language="IPPcode22"/>"#);
    assert_structure_error(r#"<program/>"#);
    assert_structure_error(r#"<program language="IPPcode21"/>"#);
    assert_structure_error(r#"<program language="IPPcode22" author="me"/>"#);
}

#[test]
fn bad_program_children() {
    assert_structure_error(&program(r#"<instr order="1" opcode="BREAK"/>"#));
    assert_structure_error(&program("stray text"));
}

#[test]
fn bad_order() {
    for order in ["0", "-1", "abc", ""] {
        assert_structure_error(&program(&format!(
            r#"<instruction order="{order}" opcode="BREAK"/>"#
        )));
    }
    assert_structure_error(&program(r#"<instruction opcode="BREAK"/>"#));
}

#[test]
fn duplicate_order() {
    let err = load_err(&program(
        r#"<instruction order="1" opcode="BREAK"/><instruction order="1" opcode="BREAK"/>"#,
    ));
    assert_eq!(err, LoadError::DuplicateOrder { order: 1 });
}

#[test]
fn bad_opcode() {
    let err = load_err(&program(r#"<instruction order="1" opcode="JUMPZ"/>"#));
    assert_eq!(
        err,
        LoadError::UnknownOpcode {
            order: 1,
            mnemonic: "JUMPZ".to_string()
        }
    );
    assert_structure_error(&program(r#"<instruction order="1"/>"#));
}

#[test]
fn bad_argument_elements() {
    // missing
    assert_structure_error(&program(r#"<instruction order="1" opcode="WRITE"/>"#));
    // extra
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="BREAK"><arg1 type="int">1</arg1></instruction>"#,
    ));
    // gap
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="MOVE"><arg1 type="var">GF@x</arg1><arg3 type="int">1</arg3></instruction>"#,
    ));
    // duplicate
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="WRITE"><arg1 type="int">1</arg1><arg1 type="int">2</arg1></instruction>"#,
    ));
    // misnamed
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="WRITE"><param type="int">1</param></instruction>"#,
    ));
    // no type
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="WRITE"><arg1>1</arg1></instruction>"#,
    ));
}

#[test]
fn bad_literals() {
    let cases = [
        ("int", "12a"),
        ("int", "99999999999999999999"),
        ("bool", "TRUE"),
        ("nil", "null"),
        ("string", "bad\\12"),
        ("var", "XF@x"),
        ("var", "GF@1x"),
        ("label", "has space"),
        ("type", "nil"),
        ("type", "float"),
        ("float", "1.0"),
    ];
    for (ty, text) in cases {
        let xml = program(&format!(
            r#"<instruction order="1" opcode="PUSHS"><arg1 type="{ty}">{text}</arg1></instruction>"#
        ));
        assert_structure_error(&xml);
    }
}

#[test]
fn operand_kind_mismatch() {
    // WRITE takes a symbol, not a label
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="WRITE"><arg1 type="label">x</arg1></instruction>"#,
    ));
    // DEFVAR takes a variable, not a literal
    assert_structure_error(&program(
        r#"<instruction order="1" opcode="DEFVAR"><arg1 type="int">1</arg1></instruction>"#,
    ));
}

// ============================================================
// Semantic (52)
// ============================================================

#[test]
fn duplicate_label_is_semantic() {
    let err = load_err(&program(
        r#"<instruction order="1" opcode="LABEL"><arg1 type="label">a</arg1></instruction>
<instruction order="2" opcode="LABEL"><arg1 type="label">a</arg1></instruction>"#,
    ));
    assert_eq!(err.kind().exit_code(), 52);
}

#[test]
fn undefined_label_loads() {
    let xml = program(r#"<instruction order="1" opcode="JUMP"><arg1 type="label">nowhere</arg1></instruction>"#);
    assert!(load(&xml).is_ok());
}

// ============================================================
// Property-based tests
// ============================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Encode a string the way a program generator escapes it.
    fn escape(s: &str) -> String {
        s.chars()
            .map(|c| {
                if c.is_whitespace() || c == '#' || c == '\\' || (c as u32) < 32 {
                    format!("\\{:03}", c as u32)
                } else {
                    c.to_string()
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn escape_decode_roundtrip(s in "[a-z \\t\\n#\\\\]{0,30}") {
            prop_assert_eq!(decode_string(&escape(&s)), Some(s));
        }

        #[test]
        fn any_positive_order_accepted(order in 1u64..u64::MAX) {
            let xml = program(&format!(r#"<instruction order="{order}" opcode="BREAK"/>"#));
            let program = load(&xml).unwrap();
            prop_assert_eq!(program.get(0).unwrap().order, order);
        }
    }
}
