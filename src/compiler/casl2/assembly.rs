use std::fmt::{Display, Formatter, Result};

/*
Typed CASL II assembly.

Each `Inst` knows its mnemonic and how to render its operands.  Instructions are
appended to an `Assembly` which keeps them as `AsmLine`s; a label or a comment
can be attached to the line that was appended last:

```ignore
let mut asm = Assembly::new();
asm.push(Inst::Lad(Reg::Gr1, Mem::constant(10))).label("load10").comment("Load 10");
asm.push(Inst::Ret);
```

renders as

```text
LOAD10   LAD    GR1,10                  ; Load 10
         RET
```

Every line has a label column of 8, an opcode column of 6 and an operand column
of 24, separated by single spaces.
*/

pub const MAX_LABEL_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    Gr0,
    Gr1,
    Gr2,
    Gr3,
    Gr4,
    Gr5,
    Gr6,
    Gr7,
    /// The stack pointer, written `GR8` by the assembler.
    Sp,
}

impl Display for Reg {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use Reg::*;
        match self {
            Gr0 => f.write_str("GR0"),
            Gr1 => f.write_str("GR1"),
            Gr2 => f.write_str("GR2"),
            Gr3 => f.write_str("GR3"),
            Gr4 => f.write_str("GR4"),
            Gr5 => f.write_str("GR5"),
            Gr6 => f.write_str("GR6"),
            Gr7 => f.write_str("GR7"),
            Sp => f.write_str("GR8"),
        }
    }
}

/// The address field of a memory operand.
#[derive(Clone, Debug, PartialEq)]
pub enum Adr {
    Label(String),
    Const(i32),
    /// `=n`: a constant placed in the literal pool by the assembler.
    Literal(i32),
}

impl Display for Adr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Adr::Label(lbl) => f.write_str(lbl),
            Adr::Const(n) => f.write_fmt(format_args!("{}", n)),
            Adr::Literal(n) => f.write_fmt(format_args!("={}", n)),
        }
    }
}

/// A memory operand `adr[,x]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mem {
    adr: Adr,
    index: Option<Reg>,
}

impl Mem {
    pub fn label(lbl: &str) -> Mem {
        Mem {
            adr: Adr::Label(lbl.into()),
            index: None,
        }
    }

    pub fn constant(n: i32) -> Mem {
        Mem {
            adr: Adr::Const(n),
            index: None,
        }
    }

    pub fn literal(n: i32) -> Mem {
        Mem {
            adr: Adr::Literal(n),
            index: None,
        }
    }

    /// `n,x`: the effective address is `n` plus the contents of `x`.
    pub fn indexed(n: i32, index: Reg) -> Mem {
        Mem {
            adr: Adr::Const(n),
            index: Some(index),
        }
    }

    fn operands(&self) -> Vec<String> {
        match self.index {
            Some(x) => vec![self.adr.to_string(), x.to_string()],
            None => vec![self.adr.to_string()],
        }
    }
}

/// The second operand of the load, arithmetic, logical and compare
/// instructions, which come in a register form and a memory form.
#[derive(Clone, Debug, PartialEq)]
pub enum Src {
    Reg(Reg),
    Mem(Mem),
}

impl Src {
    fn operands(&self) -> Vec<String> {
        match self {
            Src::Reg(r) => vec![r.to_string()],
            Src::Mem(m) => m.operands(),
        }
    }
}

impl From<Reg> for Src {
    fn from(r: Reg) -> Self {
        Src::Reg(r)
    }
}

impl From<Mem> for Src {
    fn from(m: Mem) -> Self {
        Src::Mem(m)
    }
}

/// A constant of a `DC` directive.
#[derive(Clone, Debug, PartialEq)]
pub enum Const {
    Int(i32),
    Str(String),
}

impl Display for Const {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Const::Int(n) => f.write_fmt(format_args!("{}", n)),
            Const::Str(s) => f.write_fmt(format_args!("'{}'", s.replace('\'', "''"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inst {
    // Assembler directives
    Start(Option<String>),
    End,
    Ds(u32),
    Dc(Vec<Const>),

    // Machine instructions
    Ld(Reg, Src),
    St(Reg, Mem),
    Lad(Reg, Mem),
    Adda(Reg, Src),
    Addl(Reg, Src),
    Suba(Reg, Src),
    Subl(Reg, Src),
    And(Reg, Src),
    Or(Reg, Src),
    Xor(Reg, Src),
    Cpa(Reg, Src),
    Cpl(Reg, Src),
    Sla(Reg, Mem),
    Sra(Reg, Mem),
    Sll(Reg, Mem),
    Srl(Reg, Mem),
    Jmi(Mem),
    Jnz(Mem),
    Jze(Mem),
    Jump(Mem),
    Jpl(Mem),
    Jov(Mem),
    Push(Mem),
    Pop(Reg),
    Call(Mem),
    Ret,
    Svc(Mem),
    Nop,

    // Macros
    In(String, String),
    Out(String, String),
    Rpush,
    Rpop,
}

impl Inst {
    pub fn mnemonic(&self) -> &'static str {
        use Inst::*;
        match self {
            Start(_) => "START",
            End => "END",
            Ds(_) => "DS",
            Dc(_) => "DC",
            Ld(..) => "LD",
            St(..) => "ST",
            Lad(..) => "LAD",
            Adda(..) => "ADDA",
            Addl(..) => "ADDL",
            Suba(..) => "SUBA",
            Subl(..) => "SUBL",
            And(..) => "AND",
            Or(..) => "OR",
            Xor(..) => "XOR",
            Cpa(..) => "CPA",
            Cpl(..) => "CPL",
            Sla(..) => "SLA",
            Sra(..) => "SRA",
            Sll(..) => "SLL",
            Srl(..) => "SRL",
            Jmi(_) => "JMI",
            Jnz(_) => "JNZ",
            Jze(_) => "JZE",
            Jump(_) => "JUMP",
            Jpl(_) => "JPL",
            Jov(_) => "JOV",
            Push(_) => "PUSH",
            Pop(_) => "POP",
            Call(_) => "CALL",
            Ret => "RET",
            Svc(_) => "SVC",
            Nop => "NOP",
            In(..) => "IN",
            Out(..) => "OUT",
            Rpush => "RPUSH",
            Rpop => "RPOP",
        }
    }

    pub fn operands(&self) -> Vec<String> {
        use Inst::*;
        match self {
            Start(entry) => entry.iter().cloned().collect(),
            End | Ret | Nop | Rpush | Rpop => vec![],
            Ds(size) => vec![size.to_string()],
            Dc(consts) => consts.iter().map(|c| c.to_string()).collect(),
            Ld(r, src) | Adda(r, src) | Addl(r, src) | Suba(r, src) | Subl(r, src)
            | And(r, src) | Or(r, src) | Xor(r, src) | Cpa(r, src) | Cpl(r, src) => {
                let mut ops = vec![r.to_string()];
                ops.extend(src.operands());
                ops
            }
            St(r, m) | Lad(r, m) | Sla(r, m) | Sra(r, m) | Sll(r, m) | Srl(r, m) => {
                let mut ops = vec![r.to_string()];
                ops.extend(m.operands());
                ops
            }
            Jmi(m) | Jnz(m) | Jze(m) | Jump(m) | Jpl(m) | Jov(m) | Push(m) | Call(m)
            | Svc(m) => m.operands(),
            Pop(r) => vec![r.to_string()],
            In(buf, len) | Out(buf, len) => vec![buf.clone(), len.clone()],
        }
    }
}

impl Display for Inst {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let ops = self.operands();
        if ops.is_empty() {
            f.write_str(self.mnemonic())
        } else {
            f.write_fmt(format_args!("{} {}", self.mnemonic(), ops.join(",")))
        }
    }
}

/// One line of assembly output.  A line with neither an opcode nor operands is
/// a pure comment line (or a blank line when it has no comment either).
#[derive(Clone, Debug, PartialEq)]
pub struct AsmLine {
    label: Option<String>,
    opcode: String,
    operands: Vec<String>,
    comment: Option<String>,
}

impl AsmLine {
    pub fn new(inst: &Inst) -> AsmLine {
        AsmLine {
            label: None,
            opcode: inst.mnemonic().into(),
            operands: inst.operands(),
            comment: None,
        }
    }

    pub fn remark(text: &str) -> AsmLine {
        AsmLine {
            label: None,
            opcode: String::new(),
            operands: vec![],
            comment: Some(text.into()),
        }
    }

    pub fn blank() -> AsmLine {
        AsmLine {
            label: None,
            opcode: String::new(),
            operands: vec![],
            comment: None,
        }
    }

    /// Labels are upper cased and cut to the width of the label column.  An
    /// empty label clears the label.
    pub fn set_label(&mut self, label: &str) {
        self.label = if label.is_empty() {
            None
        } else {
            Some(
                label
                    .chars()
                    .take(MAX_LABEL_LEN)
                    .collect::<String>()
                    .to_uppercase(),
            )
        };
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = Some(comment.into());
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    pub fn operands(&self) -> &[String] {
        &self.operands
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl Display for AsmLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let ops = self.operands.join(",");
        if self.opcode.is_empty() && ops.is_empty() {
            return match &self.comment {
                Some(c) => f.write_fmt(format_args!("; {}\n", c)),
                None => f.write_str("\n"),
            };
        }

        let comment = match &self.comment {
            Some(c) if !c.is_empty() => format!("; {}", c),
            _ => String::new(),
        };
        f.write_fmt(format_args!(
            "{:<8} {:<6} {:<24}{}\n",
            self.label.as_deref().unwrap_or(""),
            self.opcode,
            ops,
            comment
        ))
    }
}

/// An append-only sequence of assembly lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assembly {
    lines: Vec<AsmLine>,
}

impl Assembly {
    pub fn new() -> Assembly {
        Assembly { lines: vec![] }
    }

    pub fn push(&mut self, inst: Inst) -> &mut Self {
        self.lines.push(AsmLine::new(&inst));
        self
    }

    /// Adds a pure comment line.
    pub fn remark(&mut self, text: &str) -> &mut Self {
        self.lines.push(AsmLine::remark(text));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(AsmLine::blank());
        self
    }

    /// Labels the most recently added line.  Does nothing when there are no lines.
    pub fn label(&mut self, label: &str) -> &mut Self {
        if let Some(last) = self.lines.last_mut() {
            last.set_label(label);
        }
        self
    }

    /// Attaches a comment to the most recently added line.  Does nothing when
    /// there are no lines.
    pub fn comment(&mut self, text: &str) -> &mut Self {
        if let Some(last) = self.lines.last_mut() {
            last.set_comment(text);
        }
        self
    }

    pub fn last_is_ret(&self) -> bool {
        self.lines.last().map_or(false, |l| l.opcode == "RET")
    }

    pub fn lines(&self) -> &[AsmLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn build(&self) -> String {
        self.to_string()
    }
}

impl Display for Assembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for line in &self.lines {
            f.write_fmt(format_args!("{}", line))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        for (line, expected) in vec![
            (
                {
                    let mut l = AsmLine::new(&Inst::Ld(Reg::Gr1, Mem::label("VAR").into()));
                    l.set_label("start");
                    l.set_comment("Load variable");
                    l
                },
                "START    LD     GR1,VAR                 ; Load variable\n",
            ),
            (
                {
                    let mut l = AsmLine::new(&Inst::St(Reg::Gr1, Mem::label("RESULT")));
                    l.set_label("long_label");
                    l
                },
                "LONG_LAB ST     GR1,RESULT              \n",
            ),
            (
                AsmLine::new(&Inst::Ret),
                "         RET                            \n",
            ),
            (AsmLine::remark("Prologue"), "; Prologue\n"),
            (AsmLine::blank(), "\n"),
        ] {
            assert_eq!(line.to_string(), expected);
        }
    }

    #[test]
    fn empty_label_and_comment() {
        let mut l = AsmLine::new(&Inst::Nop);
        l.set_label("x");
        l.set_label("");
        l.set_comment("");
        assert_eq!(l.label(), None);
        assert_eq!(l.to_string(), "         NOP                            \n");
    }

    #[test]
    fn operands() {
        for (inst, expected) in vec![
            (Inst::Ld(Reg::Gr1, Reg::Gr2.into()), "LD GR1,GR2"),
            (
                Inst::Ld(Reg::Gr1, Mem::indexed(65535, Reg::Gr7).into()),
                "LD GR1,65535,GR7",
            ),
            (Inst::Lad(Reg::Sp, Mem::indexed(-3, Reg::Sp)), "LAD GR8,-3,GR8"),
            (Inst::Adda(Reg::Gr1, Mem::literal(5).into()), "ADDA GR1,=5"),
            (Inst::Push(Mem::indexed(0, Reg::Gr1)), "PUSH 0,GR1"),
            (Inst::Pop(Reg::Gr7), "POP GR7"),
            (Inst::Start(None), "START"),
            (Inst::Start(Some("ENTRY".into())), "START ENTRY"),
            (Inst::Ds(256), "DS 256"),
            (
                Inst::Dc(vec![Const::Str("it's".into()), Const::Int(10)]),
                "DC 'it''s',10",
            ),
            (Inst::In("IBUF".into(), "ILEN".into()), "IN IBUF,ILEN"),
            (Inst::Sla(Reg::Gr1, Mem::constant(1)), "SLA GR1,1"),
            (Inst::Rpush, "RPUSH"),
        ] {
            assert_eq!(inst.to_string(), expected);
        }
    }

    #[test]
    fn label_and_comment_patch_last_line() {
        let mut asm = Assembly::new();
        // No lines yet, so nothing to patch
        asm.label("nowhere").comment("ignored");
        assert!(asm.is_empty());

        asm.push(Inst::Start(Some("100".into())))
            .label("MAIN")
            .comment("Start of program")
            .remark("Initialize registers")
            .push(Inst::Lad(Reg::Gr1, Mem::constant(10)))
            .comment("Load 10")
            .push(Inst::Lad(Reg::Gr2, Mem::constant(20)))
            .comment("Load 20")
            .push(Inst::Adda(Reg::Gr1, Reg::Gr2.into()))
            .comment("Add GR2 to GR1")
            .push(Inst::Rpush)
            .comment("Save registers")
            .push(Inst::Rpop)
            .comment("Restore registers")
            .push(Inst::End)
            .label("END_LABEL")
            .comment("Program end");

        let expected = concat!(
            "MAIN     START  100                     ; Start of program\n",
            "; Initialize registers\n",
            "         LAD    GR1,10                  ; Load 10\n",
            "         LAD    GR2,20                  ; Load 20\n",
            "         ADDA   GR1,GR2                 ; Add GR2 to GR1\n",
            "         RPUSH                          ; Save registers\n",
            "         RPOP                           ; Restore registers\n",
            "END_LABE END                            ; Program end\n",
        );
        assert_eq!(asm.build(), expected);
        assert_eq!(asm.len(), 8);
        assert!(!asm.last_is_ret());

        asm.push(Inst::Ret);
        assert!(asm.last_is_ret());
    }
}
