use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use stdext::function_name;

use crate::compiler::{
    arch::{fits_in_word, WORD_MAX},
    ast::*,
    casl2::labels::{is_generated_label, symbol_label, ENTRY_LABEL, STACK_LABEL},
    CompilerError, Location,
};

use super::{
    error::{Mismatch, SemanticError},
    semantic_info::SemanticInfo,
    stack::ScopeStack,
    stringpool::StringPool,
    symbol_table::{FrameLayout, StorageClass, Symbol, SymbolTable},
    SemanticResult,
};

/// The builtin macros a `_xxx()` statement may name, compared in upper case.
const MACROS: [&str; 2] = ["_IN", "_OUT"];

/// Checks a program and computes the storage of every variable in it.  Stops at
/// the first error.
pub fn analyze(program: &Program) -> SemanticResult<SemanticInfo> {
    SemanticAnalyzer::new().analyze(program)
}

#[derive(Clone, Debug)]
struct Signature {
    return_ty: TypeSpec,
    params: Vec<TypeSpec>,
}

/// Walks a [`Program`] once, resolving every identifier against a stack of
/// lexical scopes and checking every expression against the mini-C typing
/// rules.  An analyzer is consumed by the run.
pub struct SemanticAnalyzer {
    functions: HashMap<String, Signature>,
    scopes: ScopeStack,
    layout: FrameLayout,
    record: SymbolTable,
    strings: StringPool,
    labels: HashSet<String>,
    loc: Option<Location>,
}

impl SemanticAnalyzer {
    pub fn new() -> SemanticAnalyzer {
        SemanticAnalyzer {
            functions: HashMap::new(),
            scopes: ScopeStack::new(),
            layout: FrameLayout::new(),
            record: SymbolTable::new(),
            strings: StringPool::new(),
            labels: vec![ENTRY_LABEL.to_string(), STACK_LABEL.to_string()]
                .into_iter()
                .collect(),
            loc: None,
        }
    }

    /// Keeps globals and functions from being emitted under `label`, such as
    /// the name of the program.
    pub fn reserve_label(mut self, label: &str) -> SemanticAnalyzer {
        self.labels.insert(symbol_label(label));
        self
    }

    pub fn analyze(mut self, program: &Program) -> SemanticResult<SemanticInfo> {
        debug!("Registering {} functions", program.functions.len());
        for f in &program.functions {
            self.loc = f.loc.clone();
            if self.functions.contains_key(&f.name) {
                return self.err(SemanticError::DuplicateFunction(f.name.clone()));
            }
            self.claim_label(&f.name)?;
            self.functions.insert(
                f.name.clone(),
                Signature {
                    return_ty: f.return_ty.clone(),
                    params: f.params.iter().map(|p| p.ty.decay()).collect(),
                },
            );
        }

        debug!("Declaring {} globals", program.globals.len());
        for g in &program.globals {
            self.loc = g.loc.clone();
            if self.functions.contains_key(&g.name) {
                return self.err(SemanticError::Redeclaration(g.name.clone()));
            }
            self.scopes
                .declare(Symbol::global(&g.name, g.ty.clone()))
                .map_err(|e| self.error(e))?;
            self.claim_label(&g.name)?;
        }

        let mut functions = vec![];
        for f in &program.functions {
            let (table, local_size) = self.function(f)?;
            functions.push((&f.name, table, local_size));
        }

        let mut info = SemanticInfo::new(self.scopes.globals().clone(), self.strings);
        for (name, table, local_size) in functions {
            info.add_function(name, table, local_size);
        }
        Ok(info)
    }

    fn function(&mut self, f: &FunctionDecl) -> SemanticResult<(SymbolTable, u32)> {
        debug!("Analyzing function {}", f.name);
        self.layout = FrameLayout::new();
        self.record = SymbolTable::new();

        // Parameters share the outermost scope of the body with its top level
        // locals.
        self.scopes.enter_scope();
        for p in &f.params {
            self.loc = p.loc.clone().or_else(|| f.loc.clone());
            let offset = self.layout.next_param();
            self.declare(Symbol::new(&p.name, p.ty.decay(), StorageClass::Param, offset))?;
        }
        for stmt in &f.body.statements {
            self.statement(stmt, f)?;
        }
        self.scopes.exit_scope();

        debug!(
            "Function {} has {} locals in {} words",
            f.name,
            self.record.len() - f.params.len(),
            self.layout.local_size()
        );
        Ok((
            std::mem::take(&mut self.record),
            self.layout.local_size(),
        ))
    }

    fn block(&mut self, block: &Block, func: &FunctionDecl) -> SemanticResult<()> {
        self.scopes.enter_scope();
        for stmt in &block.statements {
            self.statement(stmt, func)?;
        }
        self.scopes.exit_scope();
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement, func: &FunctionDecl) -> SemanticResult<()> {
        trace!("{} <- {:?}", function_name!(), stmt.loc());
        self.loc = stmt.loc().cloned();

        match stmt {
            Statement::VarDecl(decl) => self.var_decl(decl),
            Statement::Assign(assign) => self.assign(assign),
            Statement::Return { value, .. } => self.ret(value.as_ref(), func),
            Statement::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.condition(cond)?;
                self.block(then_block, func)?;
                match else_block {
                    Some(else_block) => self.block(else_block, func),
                    None => Ok(()),
                }
            }
            Statement::While { cond, body, .. } => {
                self.condition(cond)?;
                self.block(body, func)
            }
            Statement::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                // A variable declared by the header is visible to the rest of
                // the header and to the body only.
                self.scopes.enter_scope();
                match init {
                    Some(ForInit::Decl(decl)) => self.var_decl(decl)?,
                    Some(ForInit::Assign(assign)) => self.assign(assign)?,
                    None => (),
                }
                if let Some(cond) = cond {
                    self.loc = stmt.loc().cloned();
                    self.condition(cond)?;
                }
                if let Some(update) = update {
                    self.assign(update)?;
                }
                self.block(body, func)?;
                self.scopes.exit_scope();
                Ok(())
            }
            Statement::Block(block) => self.block(block, func),
            Statement::Macro { op, .. } => {
                if MACROS.contains(&op.to_uppercase().as_str()) {
                    Ok(())
                } else {
                    self.err(SemanticError::IllegalMacroOperation(op.clone()))
                }
            }
            Statement::Expr { expr, .. } => self.expression(expr).map(|_| ()),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) -> SemanticResult<()> {
        self.at(decl.loc.as_ref());
        let offset = self.layout.next_local(&decl.ty);

        // The variable is in scope for its own initializer.
        self.declare(Symbol::new(
            &decl.name,
            decl.ty.clone(),
            StorageClass::Local,
            offset,
        ))?;

        if let Some(init) = &decl.init {
            let ty = self.expression(init)?;
            if !ty.is_compatible(&decl.ty) {
                return self.err(SemanticError::TypeMismatch(
                    Mismatch::Initializer,
                    decl.ty.clone(),
                    ty,
                ));
            }
        }
        Ok(())
    }

    fn assign(&mut self, assign: &Assign) -> SemanticResult<()> {
        self.at(assign.loc.as_ref());
        let target = self.lvalue(&assign.target)?;
        let value = self.expression(&assign.value)?;
        if !target.is_compatible(&value) {
            return self.err(SemanticError::TypeMismatch(
                Mismatch::Assignment,
                target,
                value,
            ));
        }
        Ok(())
    }

    fn ret(&mut self, value: Option<&Expression>, func: &FunctionDecl) -> SemanticResult<()> {
        let expected = &func.return_ty;
        match value {
            None if !expected.is_void() => {
                self.err(SemanticError::MissingReturnValue(func.name.clone()))
            }
            None => Ok(()),
            Some(_) if expected.is_void() => {
                self.err(SemanticError::VoidReturnWithValue(func.name.clone()))
            }
            Some(value) => {
                let ty = self.expression(value)?;
                if ty.is_compatible(expected) {
                    Ok(())
                } else {
                    self.err(SemanticError::TypeMismatch(
                        Mismatch::Return,
                        expected.clone(),
                        ty,
                    ))
                }
            }
        }
    }

    fn condition(&mut self, cond: &Expression) -> SemanticResult<()> {
        let ty = self.expression(cond)?;
        if ty.is_simple_int() {
            Ok(())
        } else {
            self.err(SemanticError::TypeMismatch(
                Mismatch::Condition,
                TypeSpec::int(),
                ty,
            ))
        }
    }

    fn lvalue(&mut self, lv: &LValue) -> SemanticResult<TypeSpec> {
        match lv {
            LValue::Var { name } => Ok(self.lookup(name)?.ty.clone()),
            LValue::ArrayElem { name, index } => self.element(name, index),
            LValue::Deref { target } => {
                let ty = self.expression(target)?;
                self.deref(ty)
            }
        }
    }

    fn expression(&mut self, exp: &Expression) -> SemanticResult<TypeSpec> {
        match exp {
            Expression::IntLit { value } => {
                if fits_in_word(*value) {
                    Ok(TypeSpec::int())
                } else {
                    self.err(SemanticError::LiteralOutOfRange(*value))
                }
            }
            Expression::StringLit { value } => {
                if let Some(c) = value.chars().find(|c| u32::from(*c) > WORD_MAX as u32) {
                    return self.err(SemanticError::UnencodableCharacter(c));
                }
                self.strings.insert(value);
                Ok(TypeSpec::pointer(BaseType::Int, 1))
            }
            Expression::Var { name } => Ok(self.lookup(name)?.ty.clone()),
            Expression::Binary { op, left, right } => self.binary(*op, left, right),
            Expression::Unary { operand, .. } => {
                let ty = self.expression(operand)?;
                if ty.is_simple_int() {
                    Ok(TypeSpec::int())
                } else {
                    self.err(SemanticError::TypeMismatch(
                        Mismatch::Operand,
                        TypeSpec::int(),
                        ty,
                    ))
                }
            }
            Expression::AddressOf { name } => Ok(self.lookup(name)?.ty.address_type()),
            Expression::Deref { operand } => {
                let ty = self.expression(operand)?;
                self.deref(ty)
            }
            Expression::Cast { ty, operand } => {
                self.expression(operand)?;
                Ok(ty.clone())
            }
            Expression::ArrayElem { name, index } => self.element(name, index),
            Expression::Call { name, args } => self.call(name, args),
        }
    }

    fn binary(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> SemanticResult<TypeSpec> {
        use BinaryOperator::*;

        let lt = self.expression(left)?;
        let rt = self.expression(right)?;
        match op {
            Add => {
                if lt.is_simple_int() {
                    Ok(rt)
                } else if rt.is_simple_int() {
                    Ok(lt)
                } else {
                    self.err(SemanticError::TypeMismatch(Mismatch::Binary(op), lt, rt))
                }
            }
            Sub => {
                if rt.is_simple_int() {
                    Ok(lt)
                } else if lt.is_compatible(&rt) {
                    Ok(TypeSpec::int())
                } else {
                    self.err(SemanticError::TypeMismatch(Mismatch::Binary(op), lt, rt))
                }
            }
            BAnd | BOr => {
                if lt.is_simple_int() && rt.is_simple_int() {
                    Ok(TypeSpec::int())
                } else {
                    self.err(SemanticError::TypeMismatch(Mismatch::Binary(op), lt, rt))
                }
            }
            Eq | NEq | Ls | LsEq | Gr | GrEq => {
                if lt.is_compatible(&rt) {
                    Ok(TypeSpec::int())
                } else {
                    self.err(SemanticError::TypeMismatch(Mismatch::Comparison, lt, rt))
                }
            }
            Mul | Div => self.err(SemanticError::UnsupportedOperator(op)),
        }
    }

    fn element(&mut self, name: &str, index: &Expression) -> SemanticResult<TypeSpec> {
        let base = self.lookup(name)?.ty.clone();
        if base.effective_pointer_depth() == 0 {
            return self.err(SemanticError::NotAnArray(name.into()));
        }
        let ty = self.expression(index)?;
        if !ty.is_simple_int() {
            return self.err(SemanticError::TypeMismatch(
                Mismatch::Index,
                TypeSpec::int(),
                ty,
            ));
        }
        Ok(base.deref_type())
    }

    fn deref(&self, ty: TypeSpec) -> SemanticResult<TypeSpec> {
        if ty.effective_pointer_depth() == 0 {
            self.err(SemanticError::InvalidDereference(ty))
        } else {
            Ok(ty.deref_type())
        }
    }

    fn call(&mut self, name: &str, args: &[Expression]) -> SemanticResult<TypeSpec> {
        let sig = match self.functions.get(name) {
            Some(sig) => sig.clone(),
            None => return self.err(SemanticError::UndeclaredFunction(name.into())),
        };

        if args.len() != sig.params.len() {
            return self.err(SemanticError::ArgumentCountMismatch(
                name.into(),
                sig.params.len(),
                args.len(),
            ));
        }

        for (idx, (arg, param)) in args.iter().zip(sig.params.iter()).enumerate() {
            let ty = self.expression(arg)?;
            if !ty.is_compatible(param) {
                return self.err(SemanticError::ArgumentTypeMismatch(
                    name.into(),
                    idx,
                    param.clone(),
                    ty,
                ));
            }
        }

        Ok(sig.return_ty)
    }

    /// Globals and functions are emitted under their label, which must not be
    /// taken by another global or function, a fixed label, or a generated one.
    fn claim_label(&mut self, name: &str) -> SemanticResult<()> {
        let label = symbol_label(name);
        if is_generated_label(&label) || !self.labels.insert(label.clone()) {
            return self.err(SemanticError::LabelCollision(name.into(), label));
        }
        Ok(())
    }

    fn declare(&mut self, symbol: Symbol) -> SemanticResult<()> {
        self.scopes
            .declare(symbol.clone())
            .map_err(|e| self.error(e))?;
        self.record.record(symbol);
        Ok(())
    }

    fn lookup(&self, name: &str) -> SemanticResult<&Symbol> {
        self.scopes.lookup(name).map_err(|e| self.error(e))
    }

    /// Moves the reported location to a nested node when it carries one.
    fn at(&mut self, loc: Option<&Location>) {
        if loc.is_some() {
            self.loc = loc.cloned();
        }
    }

    fn error(&self, inner: SemanticError) -> CompilerError<SemanticError> {
        CompilerError::new(self.loc.clone(), inner)
    }

    fn err<T>(&self, inner: SemanticError) -> SemanticResult<T> {
        Err(self.error(inner))
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        SemanticAnalyzer::new()
    }
}
