use std::convert::TryFrom;
use std::collections::BTreeMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use stdext::function_name;

use super::{
    arch::{
        fits_in_word,
        registers::{ACC, ADDRESS_SPACE, FRAME, RETVAL, SCRATCH, STACK},
    },
    ast::*,
    casl2::{
        labels::{self, symbol_label, ENTRY_LABEL, STACK_LABEL},
        Assembly, Const, Inst, LabelError, LabelGenerator, Mem,
    },
    semantics::{
        symbol_table::{StorageClass, Symbol},
        ScopeStack, SemanticInfo,
    },
};

const MAIN_FN: &str = "MAIN";

/// Buffers used by the `_in()` and `_out()` macros.  They are ordinary globals
/// which the program itself declares.
const IN_BUFFER: (&str, &str) = ("IBUF", "ILEN");
const OUT_BUFFER: (&str, &str) = ("OBUF", "OLEN");

/// Settings for the shape of the generated program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Label of the `START` line.
    pub program_name: String,
    /// Number of words reserved for the run time stack.
    pub stack_size: u32,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            program_name: "PRG".into(),
            stack_size: 256,
        }
    }
}

/// Errors raised while generating code.  These can only be caused by a bug
/// in the compiler or by a program tree which did not pass semantic analysis.
#[derive(Clone, Debug, PartialEq)]
pub enum CodegenError {
    LabelSpaceExhausted { description: String, limit: u32 },
    InvalidLabelPrefix(String),
    UnimplementedConstruct(String),
    UnresolvedSymbol { function: String, name: String },
    UnpooledLiteral(String),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::LabelSpaceExhausted { description, limit } => f.write_fmt(
                format_args!(
                    "the number of labels for {} exceeds the limit of {}",
                    description, limit
                ),
            ),
            CodegenError::InvalidLabelPrefix(prefix) => {
                f.write_fmt(format_args!("'{}' is too long for a label prefix", prefix))
            }
            CodegenError::UnimplementedConstruct(what) => {
                f.write_fmt(format_args!("no code generation rule for {}", what))
            }
            CodegenError::UnresolvedSymbol { function, name } => f.write_fmt(format_args!(
                "{} has no storage in function {}",
                name, function
            )),
            CodegenError::UnpooledLiteral(s) => {
                f.write_fmt(format_args!("string literal {:?} is not in the pool", s))
            }
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<LabelError> for CodegenError {
    fn from(e: LabelError) -> Self {
        match e {
            LabelError::InvalidLabelPrefix(prefix) => CodegenError::InvalidLabelPrefix(prefix),
            LabelError::LabelSpaceExhausted { description, limit } => {
                CodegenError::LabelSpaceExhausted { description, limit }
            }
        }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;

/// One generator per construct so that labels never collide across
/// constructs.
struct Labels {
    cmp_true: LabelGenerator,
    cmp_end: LabelGenerator,
    logic_short: LabelGenerator,
    logic_end: LabelGenerator,
    if_else: LabelGenerator,
    if_end: LabelGenerator,
    while_start: LabelGenerator,
    while_end: LabelGenerator,
    for_start: LabelGenerator,
    for_end: LabelGenerator,
}

impl Labels {
    fn new() -> CodegenResult<Labels> {
        Ok(Labels {
            cmp_true: LabelGenerator::new(labels::CMP_TRUE, "comparison true")?,
            cmp_end: LabelGenerator::new(labels::CMP_END, "comparison end")?,
            logic_short: LabelGenerator::new(labels::LOGIC_SHORT, "logical short circuit")?,
            logic_end: LabelGenerator::new(labels::LOGIC_END, "logical end")?,
            if_else: LabelGenerator::new(labels::IF_ELSE, "if else")?,
            if_end: LabelGenerator::new(labels::IF_END, "if end")?,
            while_start: LabelGenerator::new(labels::WHILE_START, "while start")?,
            while_end: LabelGenerator::new(labels::WHILE_END, "while end")?,
            for_start: LabelGenerator::new(labels::FOR_START, "for start")?,
            for_end: LabelGenerator::new(labels::FOR_END, "for end")?,
        })
    }
}

/// The function currently being emitted.  Declarations are taken from the
/// function's declaration record in the same order the analyzer made them.
#[derive(Default)]
struct Frame {
    name: String,
    decls: Vec<Symbol>,
    cursor: usize,
    local_size: u32,
}

/**
 * Lowers a semantically checked program into CASL II assembly.
 *
 * Storage locations are never computed here: every parameter and local is
 * read from the `SemanticInfo` the analyzer produced.  The generator only
 * rebuilds block visibility so that a shadowed name resolves to the right
 * declaration.
 */
pub struct Compiler<'a> {
    info: &'a SemanticInfo,
    config: &'a CodegenConfig,
    asm: Assembly,
    labels: Labels,
    strings: BTreeMap<String, String>,
    scopes: ScopeStack,
    frame: Frame,
}

impl<'a> Compiler<'a> {
    pub fn compile(
        program: &Program,
        info: &'a SemanticInfo,
        config: &'a CodegenConfig,
    ) -> CodegenResult<Assembly> {
        let mut compiler = Compiler::new(info, config)?;
        compiler.program(program)?;
        Ok(compiler.asm)
    }

    fn new(info: &'a SemanticInfo, config: &'a CodegenConfig) -> CodegenResult<Compiler<'a>> {
        let mut string_labels = LabelGenerator::new(labels::STRING_LITERAL, "string literal")?;
        let mut strings = BTreeMap::new();
        for s in info.strings().iter() {
            strings.insert(s.clone(), string_labels.next()?);
        }

        let mut scopes = ScopeStack::new();
        if let Some(globals) = info.globals() {
            for g in globals.iter() {
                scopes
                    .declare(g.clone())
                    .map_err(|_| CodegenError::UnresolvedSymbol {
                        function: super::semantics::GLOBAL_SCOPE.into(),
                        name: g.name.clone(),
                    })?;
            }
        }

        Ok(Compiler {
            info,
            config,
            asm: Assembly::new(),
            labels: Labels::new()?,
            strings,
            scopes,
            frame: Frame::default(),
        })
    }

    fn program(&mut self, program: &Program) -> CodegenResult<()> {
        let main = program
            .functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(MAIN_FN));

        self.asm
            .push(Inst::Start(main.map(|_| ENTRY_LABEL.into())))
            .label(&self.config.program_name);

        self.data_section(program)?;

        if let Some(main) = main {
            debug!("Entry point calls {}", main.name);
            self.asm
                .push(Inst::Lad(STACK, Mem::label(STACK_LABEL)))
                .label(ENTRY_LABEL)
                .push(Inst::Lad(
                    STACK,
                    Mem::indexed(self.config.stack_size as i32, STACK),
                ))
                .push(Inst::Call(Mem::label(&symbol_label(&main.name))))
                .push(Inst::Ret);
        }

        for f in &program.functions {
            self.function(f)?;
        }

        self.asm
            .push(Inst::Ds(self.config.stack_size))
            .label(STACK_LABEL)
            .push(Inst::End);
        Ok(())
    }

    fn data_section(&mut self, program: &Program) -> CodegenResult<()> {
        for g in &program.globals {
            self.asm
                .push(Inst::Ds(g.ty.size()))
                .label(&symbol_label(&g.name));
        }

        for (value, label) in &self.strings {
            let mut consts = vec![];
            let mut run = String::new();
            for c in value.chars() {
                if (' '..='~').contains(&c) {
                    run.push(c);
                } else {
                    if !run.is_empty() {
                        consts.push(Const::Str(std::mem::take(&mut run)));
                    }
                    let word = u16::try_from(u32::from(c)).map_err(|_| {
                        CodegenError::UnimplementedConstruct(format!("character {:?}", c))
                    })?;
                    consts.push(Const::Int(i32::from(word)));
                }
            }
            if !run.is_empty() {
                consts.push(Const::Str(run));
            }
            consts.push(Const::Int(0));

            for (i, c) in consts.into_iter().enumerate() {
                self.asm.push(Inst::Dc(vec![c]));
                if i == 0 {
                    self.asm.label(label);
                }
            }
        }
        Ok(())
    }

    fn function(&mut self, f: &FunctionDecl) -> CodegenResult<()> {
        debug!("{}: {}", function_name!(), f.name);
        let decls: Vec<Symbol> = self
            .info
            .symbol_table(&f.name)
            .map(|t| t.iter().cloned().collect())
            .ok_or_else(|| CodegenError::UnresolvedSymbol {
                function: f.name.clone(),
                name: f.name.clone(),
            })?;
        let local_size = self.info.local_size(&f.name).unwrap_or(0);
        self.frame = Frame {
            name: f.name.clone(),
            decls,
            cursor: 0,
            local_size,
        };

        self.scopes.enter_scope();
        for p in &f.params {
            let sym = self.next_decl(&p.name, StorageClass::Param)?;
            self.declare(sym)?;
        }

        self.asm
            .remark(&format!("Function: {}", f.name))
            .push(Inst::Push(Mem::indexed(0, FRAME)))
            .label(&symbol_label(&f.name))
            .comment("Prologue")
            .push(Inst::Lad(FRAME, Mem::indexed(0, STACK)));
        if local_size > 0 {
            self.asm.push(Inst::Lad(
                STACK,
                Mem::indexed(ADDRESS_SPACE - local_size as i32, STACK),
            ));
        }

        for stmt in &f.body.statements {
            self.statement(stmt)?;
        }
        if !f.body.ends_with_return() {
            self.epilogue();
        }
        self.scopes.exit_scope();

        if let Some(extra) = self.frame.decls.get(self.frame.cursor) {
            return Err(CodegenError::UnresolvedSymbol {
                function: f.name.clone(),
                name: extra.name.clone(),
            });
        }
        Ok(())
    }

    fn epilogue(&mut self) {
        let size = self.frame.local_size;
        if size > 0 {
            self.asm
                .push(Inst::Lad(STACK, Mem::indexed(size as i32, STACK)))
                .comment("Epilogue")
                .push(Inst::Pop(FRAME));
        } else {
            self.asm.push(Inst::Pop(FRAME)).comment("Epilogue");
        }
        self.asm.push(Inst::Ret);
    }

    fn block(&mut self, block: &Block) -> CodegenResult<()> {
        self.scopes.enter_scope();
        for stmt in &block.statements {
            self.statement(stmt)?;
        }
        self.scopes.exit_scope();
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement) -> CodegenResult<()> {
        trace!("{} <- {:?}", function_name!(), stmt.loc());
        match stmt {
            Statement::VarDecl(decl) => self.var_decl(decl),
            Statement::Assign(assign) => self.assign(assign),
            Statement::Return { value, .. } => {
                if let Some(value) = value {
                    self.expression(value)?;
                    self.asm.push(Inst::Ld(RETVAL, ACC.into()));
                }
                self.epilogue();
                Ok(())
            }
            Statement::If {
                cond,
                then_block,
                else_block: Some(else_block),
                ..
            } => {
                let else_label = self.labels.if_else.next()?;
                let end = self.labels.if_end.next()?;
                self.expression(cond)?;
                self.asm.push(Inst::Jze(Mem::label(&else_label)));
                self.block(then_block)?;
                self.asm
                    .push(Inst::Jump(Mem::label(&end)))
                    .push(Inst::Nop)
                    .label(&else_label);
                self.block(else_block)?;
                self.asm.push(Inst::Nop).label(&end);
                Ok(())
            }
            Statement::If {
                cond,
                then_block,
                else_block: None,
                ..
            } => {
                let end = self.labels.if_end.next()?;
                self.expression(cond)?;
                self.asm.push(Inst::Jze(Mem::label(&end)));
                self.block(then_block)?;
                self.asm.push(Inst::Nop).label(&end);
                Ok(())
            }
            Statement::While { cond, body, .. } => {
                let start = self.labels.while_start.next()?;
                let end = self.labels.while_end.next()?;
                self.asm.push(Inst::Nop).label(&start);
                self.expression(cond)?;
                self.asm.push(Inst::Jze(Mem::label(&end)));
                self.block(body)?;
                self.asm
                    .push(Inst::Jump(Mem::label(&start)))
                    .push(Inst::Nop)
                    .label(&end);
                Ok(())
            }
            Statement::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                let start = self.labels.for_start.next()?;
                let end = self.labels.for_end.next()?;
                self.scopes.enter_scope();
                match init {
                    Some(ForInit::Decl(decl)) => self.var_decl(decl)?,
                    Some(ForInit::Assign(assign)) => self.assign(assign)?,
                    None => (),
                }
                self.asm.push(Inst::Nop).label(&start);
                if let Some(cond) = cond {
                    self.expression(cond)?;
                    self.asm.push(Inst::Jze(Mem::label(&end)));
                }
                self.block(body)?;
                if let Some(update) = update {
                    self.assign(update)?;
                }
                self.asm
                    .push(Inst::Jump(Mem::label(&start)))
                    .push(Inst::Nop)
                    .label(&end);
                self.scopes.exit_scope();
                Ok(())
            }
            Statement::Block(block) => self.block(block),
            Statement::Macro { op, .. } => {
                let inst = match op.to_uppercase().as_str() {
                    "_IN" => Inst::In(IN_BUFFER.0.into(), IN_BUFFER.1.into()),
                    "_OUT" => Inst::Out(OUT_BUFFER.0.into(), OUT_BUFFER.1.into()),
                    _ => {
                        return Err(CodegenError::UnimplementedConstruct(format!(
                            "macro {}",
                            op
                        )))
                    }
                };
                self.asm.push(inst);
                Ok(())
            }
            Statement::Expr { expr, .. } => self.expression(expr),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) -> CodegenResult<()> {
        let sym = self.next_decl(&decl.name, StorageClass::Local)?;
        self.declare(sym.clone())?;
        if let Some(init) = &decl.init {
            self.expression(init)?;
            let adr = self.address(&sym);
            self.asm.push(Inst::St(ACC, adr));
        }
        Ok(())
    }

    fn assign(&mut self, assign: &Assign) -> CodegenResult<()> {
        match &assign.target {
            LValue::Var { name } => {
                let sym = self.lookup(name)?;
                self.expression(&assign.value)?;
                let adr = self.address(&sym);
                self.asm.push(Inst::St(ACC, adr));
            }
            LValue::ArrayElem { name, index } => {
                self.expression(&assign.value)?;
                self.asm.push(Inst::Push(Mem::indexed(0, ACC)));
                self.element_address(name, index)?;
                self.asm
                    .push(Inst::Pop(ACC))
                    .push(Inst::St(ACC, Mem::indexed(0, SCRATCH)));
            }
            LValue::Deref { target } => {
                self.expression(&assign.value)?;
                self.asm.push(Inst::Push(Mem::indexed(0, ACC)));
                self.expression(target)?;
                self.asm
                    .push(Inst::Ld(SCRATCH, ACC.into()))
                    .push(Inst::Pop(ACC))
                    .push(Inst::St(ACC, Mem::indexed(0, SCRATCH)));
            }
        }
        Ok(())
    }

    fn expression(&mut self, exp: &Expression) -> CodegenResult<()> {
        match exp {
            Expression::IntLit { value } => {
                if !fits_in_word(*value) {
                    return Err(CodegenError::UnimplementedConstruct(format!(
                        "integer literal {}",
                        value
                    )));
                }
                self.asm.push(Inst::Lad(ACC, Mem::constant(*value)));
            }
            Expression::StringLit { value } => {
                let label = self
                    .strings
                    .get(value)
                    .ok_or_else(|| CodegenError::UnpooledLiteral(value.clone()))?;
                self.asm.push(Inst::Lad(ACC, Mem::label(label)));
            }
            Expression::Var { name } => {
                let sym = self.lookup(name)?;
                let adr = self.address(&sym);
                // Arrays decay to the address of their first element
                if sym.ty.is_array() {
                    self.asm.push(Inst::Lad(ACC, adr));
                } else {
                    self.asm.push(Inst::Ld(ACC, adr.into()));
                }
            }
            Expression::Binary { op, left, right } => self.binary(*op, left, right)?,
            Expression::Unary {
                op: UnaryOperator::Negate,
                operand,
            } => {
                self.expression(operand)?;
                self.asm
                    .push(Inst::Ld(SCRATCH, ACC.into()))
                    .push(Inst::Lad(ACC, Mem::constant(0)))
                    .push(Inst::Suba(ACC, SCRATCH.into()));
            }
            Expression::Unary {
                op: UnaryOperator::Not,
                operand,
            } => {
                let t = self.labels.cmp_true.next()?;
                let end = self.labels.cmp_end.next()?;
                self.expression(operand)?;
                self.asm
                    .push(Inst::Ld(ACC, ACC.into()))
                    .push(Inst::Jze(Mem::label(&t)));
                self.bool_result(&t, &end);
            }
            Expression::AddressOf { name } => {
                let sym = self.lookup(name)?;
                let adr = self.address(&sym);
                self.asm.push(Inst::Lad(ACC, adr));
            }
            Expression::Deref { operand } => {
                self.expression(operand)?;
                self.asm.push(Inst::Ld(ACC, Mem::indexed(0, ACC).into()));
            }
            Expression::Cast { operand, .. } => self.expression(operand)?,
            Expression::ArrayElem { name, index } => {
                self.element_address(name, index)?;
                self.asm.push(Inst::Ld(ACC, Mem::indexed(0, SCRATCH).into()));
            }
            Expression::Call { name, args } => {
                for arg in args.iter().rev() {
                    self.expression(arg)?;
                    self.asm.push(Inst::Push(Mem::indexed(0, ACC)));
                }
                self.asm.push(Inst::Call(Mem::label(&symbol_label(name))));
                if !args.is_empty() {
                    self.asm
                        .push(Inst::Lad(STACK, Mem::indexed(args.len() as i32, STACK)));
                }
                self.asm.push(Inst::Ld(ACC, RETVAL.into()));
            }
        }
        Ok(())
    }

    fn binary(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> CodegenResult<()> {
        use BinaryOperator::*;

        match op {
            Mul | Div => {
                return Err(CodegenError::UnimplementedConstruct(format!(
                    "operator {}",
                    op
                )))
            }
            BAnd | BOr => return self.logical(op, left, right),
            _ => (),
        }

        self.expression(right)?;
        self.asm.push(Inst::Push(Mem::indexed(0, ACC)));
        self.expression(left)?;
        self.asm.push(Inst::Pop(SCRATCH));

        match op {
            Add => {
                self.asm.push(Inst::Adda(ACC, SCRATCH.into()));
            }
            Sub => {
                self.asm.push(Inst::Suba(ACC, SCRATCH.into()));
            }
            _ if op.is_comparison() => self.comparison(op)?,
            _ => {
                return Err(CodegenError::UnimplementedConstruct(format!(
                    "operator {}",
                    op
                )))
            }
        }
        Ok(())
    }

    /// Compares the accumulator with the scratch register and leaves 1 in the
    /// accumulator if `op` holds, otherwise 0.
    fn comparison(&mut self, op: BinaryOperator) -> CodegenResult<()> {
        use BinaryOperator::*;

        let t = self.labels.cmp_true.next()?;
        let end = self.labels.cmp_end.next()?;
        let target = || Mem::label(&t);

        self.asm.push(Inst::Cpa(ACC, SCRATCH.into()));
        match op {
            Ls => self.asm.push(Inst::Jmi(target())),
            Gr => self.asm.push(Inst::Jpl(target())),
            LsEq => self
                .asm
                .push(Inst::Jmi(target()))
                .push(Inst::Jze(target())),
            GrEq => self
                .asm
                .push(Inst::Jpl(target()))
                .push(Inst::Jze(target())),
            Eq => self.asm.push(Inst::Jze(target())),
            NEq => self.asm.push(Inst::Jnz(target())),
            Add | Sub | Mul | Div | BAnd | BOr => {
                return Err(CodegenError::UnimplementedConstruct(format!(
                    "comparison {}",
                    op
                )))
            }
        };
        self.bool_result(&t, &end);
        Ok(())
    }

    fn bool_result(&mut self, t: &str, end: &str) {
        self.asm
            .push(Inst::Lad(ACC, Mem::constant(0)))
            .push(Inst::Jump(Mem::label(end)))
            .push(Inst::Lad(ACC, Mem::constant(1)))
            .label(t)
            .push(Inst::Nop)
            .label(end);
    }

    /// `&&` and `||` skip the right operand once the left one decides the
    /// result, and leave exactly 0 or 1 in the accumulator.
    fn logical(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> CodegenResult<()> {
        let short = self.labels.logic_short.next()?;
        let end = self.labels.logic_end.next()?;
        let (decided, skip, fallthrough) = match op {
            BinaryOperator::BAnd => (0, Inst::Jze(Mem::label(&short)), 1),
            _ => (1, Inst::Jnz(Mem::label(&short)), 0),
        };

        self.expression(left)?;
        self.asm.push(Inst::Ld(ACC, ACC.into())).push(skip.clone());
        self.expression(right)?;
        self.asm
            .push(Inst::Ld(ACC, ACC.into()))
            .push(skip)
            .push(Inst::Lad(ACC, Mem::constant(fallthrough)))
            .push(Inst::Jump(Mem::label(&end)))
            .push(Inst::Lad(ACC, Mem::constant(decided)))
            .label(&short)
            .push(Inst::Nop)
            .label(&end);
        Ok(())
    }

    /// Leaves the address of `name[index]` in the scratch register.  The
    /// accumulator holds the index afterwards.
    fn element_address(&mut self, name: &str, index: &Expression) -> CodegenResult<()> {
        let sym = self.lookup(name)?;
        self.expression(index)?;
        let adr = self.address(&sym);
        if sym.ty.is_array() {
            self.asm.push(Inst::Lad(SCRATCH, adr));
        } else {
            self.asm.push(Inst::Ld(SCRATCH, adr.into()));
        }
        self.asm.push(Inst::Adda(SCRATCH, ACC.into()));
        Ok(())
    }

    fn address(&self, sym: &Symbol) -> Mem {
        match sym.storage {
            StorageClass::Global => Mem::label(&symbol_label(&sym.name)),
            StorageClass::Param => Mem::indexed(sym.offset as i32 + 1, FRAME),
            StorageClass::Local => Mem::indexed(ADDRESS_SPACE - sym.offset as i32, FRAME),
        }
    }

    fn next_decl(&mut self, name: &str, storage: StorageClass) -> CodegenResult<Symbol> {
        let frame = &mut self.frame;
        match frame.decls.get(frame.cursor) {
            Some(sym) if sym.name == name && sym.storage == storage => {
                let sym = sym.clone();
                frame.cursor += 1;
                Ok(sym)
            }
            _ => Err(CodegenError::UnresolvedSymbol {
                function: frame.name.clone(),
                name: name.into(),
            }),
        }
    }

    fn declare(&mut self, sym: Symbol) -> CodegenResult<()> {
        let name = sym.name.clone();
        self.scopes
            .declare(sym)
            .map_err(|_| CodegenError::UnresolvedSymbol {
                function: self.frame.name.clone(),
                name,
            })
    }

    fn lookup(&self, name: &str) -> CodegenResult<Symbol> {
        self.scopes
            .lookup(name)
            .map(|s| s.clone())
            .map_err(|_| CodegenError::UnresolvedSymbol {
                function: self.frame.name.clone(),
                name: name.into(),
            })
    }
}
