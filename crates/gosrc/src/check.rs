//! Constant and type resolution across loaded packages
//!
//! Every package-level constant of a scanned package is evaluated to a typed
//! value. Constants of dependency packages are evaluated on demand, when a
//! scanned constant refers to them. A constant that cannot be evaluated is
//! recorded as a failure of that constant alone.

use crate::ast::{BasicLit, BinaryOp, ConstSpec, Decl, Expr, Ident, LitKind, TypeExpr, TypeName, TypeSpec, UnaryOp};
use crate::constant::{parse_float, parse_int, Value};
use crate::error::{CheckError, CheckErrorKind, Position};
use crate::loader::Package;
use crate::types::{BasicKind, Named, PackageRef, Type};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A resolved package-level constant
#[derive(Debug, Clone, PartialEq)]
pub struct Const {
    pub name: String,
    /// The package that declares the constant
    pub package: PackageRef,
    pub typ: Type,
    /// Type written on the declaring spec, or repeated from the previous spec
    pub declared: Option<Type>,
    pub value: Value,
}

/// A constant whose value could not be determined
#[derive(Debug, Clone, PartialEq)]
pub struct ConstFailure {
    /// Declared type, when it resolved
    pub declared: Option<Type>,
    pub error: CheckError,
}

/// Identifies a declaring identifier within one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefKey {
    pub file: usize,
    pub offset: usize,
}

impl DefKey {
    pub fn new(file: usize, ident: &Ident) -> Self {
        Self { file, offset: ident.pos.offset }
    }
}

/// Resolution results for one package, keyed by declaring identifier
#[derive(Debug, Clone, Default)]
pub struct TypesInfo {
    defs: HashMap<DefKey, Const>,
    failures: HashMap<DefKey, ConstFailure>,
}

impl TypesInfo {
    /// The constant declared by `ident` in the package's file number `file`
    pub fn def(&self, file: usize, ident: &Ident) -> Option<&Const> {
        self.defs.get(&DefKey::new(file, ident))
    }

    /// Why the constant declared by `ident` has no value
    pub fn failure(&self, file: usize, ident: &Ident) -> Option<&ConstFailure> {
        self.failures.get(&DefKey::new(file, ident))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConstFailure> {
        self.failures.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Evaluate every constant of the scanned packages.
///
/// Returns one `TypesInfo` per package, in the order of `packages`.
pub fn check(packages: &[Package]) -> Vec<TypesInfo> {
    let mut checker = Checker::new(packages);

    for (pkg, package) in packages.iter().enumerate() {
        if !package.scanned {
            continue;
        }
        let order = checker.scopes[pkg].order.clone();
        let mut failed = 0;
        for key in order {
            if let Err(error) = checker.eval_site(pkg, key) {
                tracing::debug!(package = %package.path, %error, "constant not evaluated");
                failed += 1;
            }
        }
        tracing::debug!(
            package = %package.path,
            constants = checker.scopes[pkg].order.len(),
            failed,
            "checked package"
        );
    }

    checker.into_infos()
}

#[derive(Debug, Clone)]
struct ConstSite<'a> {
    file: usize,
    ident: &'a Ident,
    typ: Option<&'a TypeName>,
    value: Result<&'a Expr, CheckErrorKind>,
    iota: i128,
}

#[derive(Debug, Clone, Copy)]
struct TypeSite<'a> {
    file: usize,
    spec: &'a TypeSpec,
}

#[derive(Debug, Default)]
struct FileImports<'a> {
    named: HashMap<String, &'a str>,
    dot: Vec<&'a str>,
}

#[derive(Debug, Default)]
struct Scope<'a> {
    consts: HashMap<&'a str, DefKey>,
    sites: HashMap<DefKey, ConstSite<'a>>,
    order: Vec<DefKey>,
    types: HashMap<&'a str, TypeSite<'a>>,
    imports: Vec<FileImports<'a>>,
}

enum Slot<T> {
    Busy,
    Done(T),
}

#[derive(Debug, Clone)]
struct Operand {
    typ: Type,
    value: Value,
}

impl Operand {
    fn untyped(kind: BasicKind, value: Value) -> Self {
        Self { typ: Type::Basic(kind), value }
    }

    fn describe(&self) -> String {
        format!("{} (type {})", self.value, self.typ)
    }
}

impl From<Const> for Operand {
    fn from(c: Const) -> Self {
        Self { typ: c.typ, value: c.value }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ctx {
    pkg: usize,
    file: usize,
    iota: Option<i128>,
}

struct Checker<'a> {
    packages: &'a [Package],
    scopes: Vec<Scope<'a>>,
    consts: HashMap<(usize, DefKey), Slot<Const>>,
    failures: HashMap<(usize, DefKey), ConstFailure>,
    types: HashMap<(usize, &'a str), Slot<Type>>,
}

impl<'a> Checker<'a> {
    fn new(packages: &'a [Package]) -> Self {
        let by_path: HashMap<&str, usize> =
            packages.iter().enumerate().map(|(i, p)| (p.path.as_str(), i)).collect();
        let scopes = packages.iter().map(|p| build_scope(p, packages, &by_path)).collect();

        Self { packages, scopes, consts: HashMap::new(), failures: HashMap::new(), types: HashMap::new() }
    }

    fn into_infos(self) -> Vec<TypesInfo> {
        let mut infos = vec![TypesInfo::default(); self.packages.len()];
        for ((pkg, key), slot) in self.consts {
            if let Slot::Done(c) = slot {
                infos[pkg].defs.insert(key, c);
            }
        }
        for ((pkg, key), failure) in self.failures {
            infos[pkg].failures.insert(key, failure);
        }
        infos
    }

    fn package_index(&self, path: &str) -> Option<usize> {
        self.packages.iter().position(|p| p.path == path)
    }

    fn package_ref(&self, pkg: usize) -> PackageRef {
        let package = &self.packages[pkg];
        PackageRef::new(package.name.clone(), package.path.clone())
    }

    fn error(&self, ctx: Ctx, pos: Position, kind: CheckErrorKind) -> CheckError {
        CheckError { file: self.packages[ctx.pkg].files[ctx.file].path.clone(), pos, kind }
    }

    fn eval_site(&mut self, pkg: usize, key: DefKey) -> Result<Const, CheckError> {
        let Some(site) = self.scopes[pkg].sites.get(&key).cloned() else {
            let ctx = Ctx { pkg, file: key.file, iota: None };
            let pos = Position { offset: key.offset, ..Position::default() };
            let what = format!("constant at byte offset {}", key.offset);
            return Err(self.error(ctx, pos, CheckErrorKind::Undefined(what)));
        };
        let ctx = Ctx { pkg, file: site.file, iota: Some(site.iota) };

        if let Some(failure) = self.failures.get(&(pkg, key)) {
            return Err(failure.error.clone());
        }
        match self.consts.get(&(pkg, key)) {
            Some(Slot::Done(c)) => return Ok(c.clone()),
            Some(Slot::Busy) => {
                return Err(self.error(
                    ctx,
                    site.ident.pos,
                    CheckErrorKind::Cycle(site.ident.name.clone()),
                ));
            }
            None => {}
        }

        self.consts.insert((pkg, key), Slot::Busy);
        match self.eval_site_uncached(ctx, &site) {
            Ok(c) => {
                tracing::trace!(name = %c.name, typ = %c.typ, value = %c.value, "resolved constant");
                self.consts.insert((pkg, key), Slot::Done(c.clone()));
                Ok(c)
            }
            Err(error) => {
                self.consts.remove(&(pkg, key));
                let declared = site.typ.and_then(|type_name| self.resolve_type(ctx, type_name).ok());
                self.failures.insert((pkg, key), ConstFailure { declared, error: error.clone() });
                Err(error)
            }
        }
    }

    fn eval_site_uncached(&mut self, ctx: Ctx, site: &ConstSite<'a>) -> Result<Const, CheckError> {
        let expr = site.value.clone().map_err(|kind| self.error(ctx, site.ident.pos, kind))?;
        let mut operand = self.eval_expr(ctx, expr)?;

        let declared = match site.typ {
            Some(type_name) => {
                let target = self.resolve_type(ctx, type_name)?;
                operand = self.assign(ctx, expr.pos(), operand, &target)?;
                Some(target)
            }
            None => None,
        };

        Ok(Const {
            name: site.ident.name.clone(),
            package: self.package_ref(ctx.pkg),
            typ: operand.typ,
            declared,
            value: operand.value,
        })
    }

    fn import_path(&self, ctx: Ctx, qualifier: &Ident) -> Result<&'a str, CheckError> {
        self.scopes[ctx.pkg].imports[ctx.file]
            .named
            .get(qualifier.name.as_str())
            .copied()
            .ok_or_else(|| self.error(ctx, qualifier.pos, CheckErrorKind::Undefined(qualifier.name.clone())))
    }

    fn resolve_type(&mut self, ctx: Ctx, type_name: &TypeName) -> Result<Type, CheckError> {
        let name = type_name.name.name.as_str();
        let pos = type_name.pos();

        let Some(qualifier) = &type_name.qualifier else {
            if self.scopes[ctx.pkg].types.contains_key(name) {
                return self.named_type(ctx.pkg, name, ctx, pos);
            }
            let dot_imports = self.scopes[ctx.pkg].imports[ctx.file].dot.clone();
            for path in dot_imports {
                if let Some(dep) = self.package_index(path) {
                    if self.scopes[dep].types.contains_key(name) {
                        return self.named_type(dep, name, ctx, pos);
                    }
                }
            }
            if let Some(kind) = BasicKind::lookup(name) {
                return Ok(Type::Basic(kind));
            }
            let kind = if self.scopes[ctx.pkg].consts.contains_key(name) {
                CheckErrorKind::NotAType(name.to_string())
            } else {
                CheckErrorKind::Undefined(name.to_string())
            };
            return Err(self.error(ctx, pos, kind));
        };

        let path = self.import_path(ctx, qualifier)?;
        match self.package_index(path) {
            Some(dep) => {
                if !type_name.name.is_exported() {
                    return Err(self.error(
                        ctx,
                        pos,
                        CheckErrorKind::Unexported(name.to_string(), path.to_string()),
                    ));
                }
                if self.scopes[dep].types.contains_key(name) {
                    self.named_type(dep, name, ctx, pos)
                } else {
                    Err(self.error(ctx, pos, CheckErrorKind::Undefined(type_name.to_string())))
                }
            }
            None => {
                // Identity is still known from the import path; the underlying type is not
                tracing::debug!(%path, %name, "type from package that is not loaded");
                let package_name = path.rsplit('/').next().unwrap_or(path);
                Ok(Type::Named(Named {
                    package: PackageRef::new(package_name, path),
                    name: name.to_string(),
                    underlying: None,
                }))
            }
        }
    }

    /// The type declared as `name` in package `pkg`, following aliases
    fn named_type(&mut self, pkg: usize, name: &str, from: Ctx, pos: Position) -> Result<Type, CheckError> {
        let Some(site) = self.scopes[pkg].types.get(name).copied() else {
            return Err(self.error(from, pos, CheckErrorKind::Undefined(name.to_string())));
        };
        let spec = site.spec;
        let key = (pkg, spec.name.name.as_str());
        let ctx = Ctx { pkg, file: site.file, iota: None };

        match self.types.get(&key) {
            Some(Slot::Done(t)) => return Ok(t.clone()),
            Some(Slot::Busy) => {
                return Err(self.error(ctx, spec.name.pos, CheckErrorKind::Cycle(spec.name.name.clone())));
            }
            None => {}
        }

        self.types.insert(key, Slot::Busy);
        let result = self.declare_type(ctx, spec);
        match &result {
            Ok(t) => {
                self.types.insert(key, Slot::Done(t.clone()));
            }
            Err(_) => {
                self.types.remove(&key);
            }
        }
        result
    }

    fn declare_type(&mut self, ctx: Ctx, spec: &TypeSpec) -> Result<Type, CheckError> {
        if spec.alias {
            return match &spec.typ {
                TypeExpr::Name(target) => self.resolve_type(ctx, target),
                TypeExpr::Other(pos) => Err(self.error(
                    ctx,
                    *pos,
                    CheckErrorKind::Unsupported(format!("alias {} of a composite type", spec.name)),
                )),
            };
        }

        let underlying = match &spec.typ {
            TypeExpr::Name(target) => self.resolve_type(ctx, target)?.underlying(),
            TypeExpr::Other(_) => None,
        };

        Ok(Type::Named(Named { package: self.package_ref(ctx.pkg), name: spec.name.name.clone(), underlying }))
    }

    fn eval_expr(&mut self, ctx: Ctx, expr: &Expr) -> Result<Operand, CheckError> {
        match expr {
            Expr::Lit(lit) => self.eval_lit(ctx, lit),
            Expr::Ident(ident) => self.eval_ident(ctx, ident),
            Expr::Selector { qualifier, name } => self.eval_selector(ctx, qualifier, name),
            Expr::Paren(inner) => self.eval_expr(ctx, inner),
            Expr::Unary { op, operand, pos } => {
                let x = self.eval_expr(ctx, operand)?;
                self.unary(ctx, *pos, *op, x)
            }
            Expr::Binary { op, lhs, rhs, pos } => {
                let x = self.eval_expr(ctx, lhs)?;
                let y = self.eval_expr(ctx, rhs)?;
                self.binary(ctx, *pos, *op, x, y)
            }
            Expr::Call { func, args, pos } => self.eval_call(ctx, *pos, func, args),
        }
    }

    fn eval_lit(&self, ctx: Ctx, lit: &BasicLit) -> Result<Operand, CheckError> {
        let invalid = || self.error(ctx, lit.pos, CheckErrorKind::InvalidLiteral(lit.value.clone()));
        match lit.kind {
            LitKind::Int => {
                let value = parse_int(&lit.value).ok_or_else(invalid)?;
                Ok(Operand::untyped(BasicKind::UntypedInt, Value::Int(value)))
            }
            LitKind::Float => {
                let value = parse_float(&lit.value).ok_or_else(invalid)?;
                Ok(Operand::untyped(BasicKind::UntypedFloat, Value::Float(value)))
            }
            LitKind::Rune => {
                let ch = lit.value.chars().next().ok_or_else(invalid)?;
                Ok(Operand::untyped(BasicKind::UntypedRune, Value::Int(i128::from(u32::from(ch)))))
            }
            LitKind::String => Ok(Operand::untyped(BasicKind::UntypedString, Value::String(lit.value.clone()))),
            LitKind::Imag => Err(self.error(
                ctx,
                lit.pos,
                CheckErrorKind::Unsupported(format!("complex constant {}", lit.value)),
            )),
        }
    }

    fn eval_ident(&mut self, ctx: Ctx, ident: &Ident) -> Result<Operand, CheckError> {
        let name = ident.name.as_str();

        let local = self.scopes[ctx.pkg].consts.get(name).copied();
        if let Some(key) = local {
            return self.eval_site(ctx.pkg, key).map(Operand::from);
        }
        if self.scopes[ctx.pkg].types.contains_key(name) {
            return Err(self.error(ctx, ident.pos, CheckErrorKind::NotAConstant(name.to_string())));
        }

        let dot_imports = self.scopes[ctx.pkg].imports[ctx.file].dot.clone();
        for path in dot_imports {
            if let Some(dep) = self.package_index(path) {
                let key = self.scopes[dep].consts.get(name).copied();
                if let Some(key) = key {
                    return self.eval_site(dep, key).map(Operand::from);
                }
            }
        }

        match name {
            "iota" => match ctx.iota {
                Some(iota) => Ok(Operand::untyped(BasicKind::UntypedInt, Value::Int(iota))),
                None => Err(self.error(ctx, ident.pos, CheckErrorKind::Undefined(name.to_string()))),
            },
            "true" | "false" => Ok(Operand::untyped(BasicKind::UntypedBool, Value::Bool(name == "true"))),
            _ if BasicKind::lookup(name).is_some() => {
                Err(self.error(ctx, ident.pos, CheckErrorKind::NotAConstant(name.to_string())))
            }
            _ => Err(self.error(ctx, ident.pos, CheckErrorKind::Undefined(name.to_string()))),
        }
    }

    fn eval_selector(&mut self, ctx: Ctx, qualifier: &Ident, name: &Ident) -> Result<Operand, CheckError> {
        let path = self.import_path(ctx, qualifier)?;
        let Some(dep) = self.package_index(path) else {
            return Err(self.error(ctx, qualifier.pos, CheckErrorKind::PackageNotLoaded(path.to_string())));
        };
        if !name.is_exported() {
            return Err(self.error(
                ctx,
                name.pos,
                CheckErrorKind::Unexported(name.name.clone(), path.to_string()),
            ));
        }

        let key = self.scopes[dep].consts.get(name.name.as_str()).copied();
        match key {
            Some(key) => self.eval_site(dep, key).map(Operand::from),
            None if self.scopes[dep].types.contains_key(name.name.as_str()) => Err(self.error(
                ctx,
                name.pos,
                CheckErrorKind::NotAConstant(format!("{}.{}", qualifier, name)),
            )),
            None => Err(self.error(ctx, name.pos, CheckErrorKind::Undefined(format!("{}.{}", qualifier, name)))),
        }
    }

    fn eval_call(&mut self, ctx: Ctx, pos: Position, func: &Expr, args: &[Expr]) -> Result<Operand, CheckError> {
        if let Expr::Ident(ident) = func {
            let shadowed = self.scopes[ctx.pkg].consts.contains_key(ident.name.as_str())
                || self.scopes[ctx.pkg].types.contains_key(ident.name.as_str());
            if ident.name == "len" && !shadowed {
                return self.eval_len(ctx, pos, args);
            }
        }

        let Some(type_name) = func.as_type_name() else {
            return Err(self.error(ctx, pos, CheckErrorKind::Unsupported(format!("call of {}", func))));
        };
        let target = self.resolve_type(ctx, &type_name)?;

        let [arg] = args else {
            return Err(self.error(
                ctx,
                pos,
                CheckErrorKind::Unsupported(format!("conversion to {} with {} arguments", target, args.len())),
            ));
        };
        let x = self.eval_expr(ctx, arg)?;
        self.convert(ctx, pos, x, &target)
    }

    fn eval_len(&mut self, ctx: Ctx, pos: Position, args: &[Expr]) -> Result<Operand, CheckError> {
        let [arg] = args else {
            return Err(self.error(
                ctx,
                pos,
                CheckErrorKind::Unsupported(format!("len with {} arguments", args.len())),
            ));
        };
        let x = self.eval_expr(ctx, arg)?;
        match &x.value {
            Value::String(s) => {
                let len = i128::try_from(s.len()).map_err(|_| self.error(ctx, pos, CheckErrorKind::Overflow))?;
                Ok(Operand { typ: Type::Basic(BasicKind::Int), value: Value::Int(len) })
            }
            _ => Err(self.error(
                ctx,
                pos,
                CheckErrorKind::InvalidOperation { op: "len".to_string(), operand: x.describe() },
            )),
        }
    }

    /// Implicit conversion of a constant to the declared type of a constant
    fn assign(&self, ctx: Ctx, pos: Position, x: Operand, target: &Type) -> Result<Operand, CheckError> {
        if &x.typ == target {
            return Ok(x);
        }
        if !x.typ.is_untyped() {
            return Err(self.not_assignable(ctx, pos, &x, target));
        }

        let Some(kind) = target.underlying() else {
            return Ok(Operand { typ: target.clone(), value: x.value });
        };

        if kind.is_integer() && matches!(x.value, Value::Float(_)) && x.value.as_exact_int().is_none() {
            return Err(self.error(ctx, pos, CheckErrorKind::Truncated(x.value.to_string())));
        }

        match represent(&x.value, kind) {
            Some(value) => Ok(Operand { typ: target.clone(), value }),
            None => Err(self.not_assignable(ctx, pos, &x, target)),
        }
    }

    fn not_assignable(&self, ctx: Ctx, pos: Position, x: &Operand, target: &Type) -> CheckError {
        self.error(
            ctx,
            pos,
            CheckErrorKind::NotAssignable {
                value: x.value.to_string(),
                from: x.typ.to_string(),
                to: target.to_string(),
            },
        )
    }

    /// Explicit conversion `T(x)`
    fn convert(&self, ctx: Ctx, pos: Position, x: Operand, target: &Type) -> Result<Operand, CheckError> {
        let Some(kind) = target.underlying() else {
            return Ok(Operand { typ: target.clone(), value: x.value });
        };

        let from_integer = x.typ.underlying().is_some_and(|k| k.is_integer());
        let value = match &x.value {
            // string(rune)
            Value::Int(code) if kind.is_string() && from_integer => {
                let ch = u32::try_from(*code).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
                Some(Value::String(ch.to_string()))
            }
            Value::Float(_) if kind.is_integer() && x.value.as_exact_int().is_none() => {
                return Err(self.error(ctx, pos, CheckErrorKind::Truncated(x.value.to_string())));
            }
            _ => represent(&x.value, kind),
        };

        value.map(|value| Operand { typ: target.clone(), value }).ok_or_else(|| {
            self.error(
                ctx,
                pos,
                CheckErrorKind::InvalidConversion {
                    value: x.value.to_string(),
                    from: x.typ.to_string(),
                    to: target.to_string(),
                },
            )
        })
    }

    fn unary(&self, ctx: Ctx, pos: Position, op: UnaryOp, x: Operand) -> Result<Operand, CheckError> {
        let invalid = || {
            self.error(
                ctx,
                pos,
                CheckErrorKind::InvalidOperation { op: op.symbol().to_string(), operand: x.describe() },
            )
        };

        let value = match (op, &x.value) {
            (UnaryOp::Plus, Value::Int(_) | Value::Float(_)) => x.value.clone(),
            (UnaryOp::Neg, Value::Int(i)) => {
                Value::Int(i.checked_neg().ok_or_else(|| self.error(ctx, pos, CheckErrorKind::Overflow))?)
            }
            (UnaryOp::Neg, Value::Float(f)) => Value::Float(-f),
            (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
            (UnaryOp::Complement, Value::Int(i)) => {
                let unsigned_bits = x.typ.underlying().filter(|k| k.is_unsigned()).and_then(|k| k.bits());
                match unsigned_bits {
                    Some(bits) => Value::Int(i ^ ((1i128 << bits) - 1)),
                    None => Value::Int(!i),
                }
            }
            _ => return Err(invalid()),
        };

        Ok(Operand { typ: x.typ, value })
    }

    fn binary(&self, ctx: Ctx, pos: Position, op: BinaryOp, x: Operand, y: Operand) -> Result<Operand, CheckError> {
        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            return self.shift(ctx, pos, op, x, y);
        }

        let (typ, a, b) = self.unify(ctx, pos, x, y)?;
        let invalid = || {
            self.error(
                ctx,
                pos,
                CheckErrorKind::InvalidOperation { op: op.symbol().to_string(), operand: typ.to_string() },
            )
        };

        if op.is_comparison() {
            let result = match op {
                BinaryOp::Eq => values_equal(&a, &b),
                BinaryOp::Ne => values_equal(&a, &b).map(|eq| !eq),
                _ => match (&a, &b) {
                    (Value::Bool(_), _) | (_, Value::Bool(_)) => None,
                    _ => a.compare(&b).map(|ord| match op {
                        BinaryOp::Lt => ord == Ordering::Less,
                        BinaryOp::Le => ord != Ordering::Greater,
                        BinaryOp::Gt => ord == Ordering::Greater,
                        _ => ord != Ordering::Less,
                    }),
                },
            };
            let result = result.ok_or_else(invalid)?;
            return Ok(Operand::untyped(BasicKind::UntypedBool, Value::Bool(result)));
        }

        let value = match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => match op {
                BinaryOp::LogAnd => Value::Bool(a && b),
                BinaryOp::LogOr => Value::Bool(a || b),
                _ => return Err(invalid()),
            },
            (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Value::String(a + &b),
            (Value::Int(a), Value::Int(b)) => {
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    BinaryOp::Mul => a.checked_mul(b),
                    BinaryOp::Div | BinaryOp::Rem if b == 0 => {
                        return Err(self.error(ctx, pos, CheckErrorKind::DivisionByZero));
                    }
                    BinaryOp::Div => a.checked_div(b),
                    BinaryOp::Rem => a.checked_rem(b),
                    BinaryOp::And => Some(a & b),
                    BinaryOp::Or => Some(a | b),
                    BinaryOp::Xor => Some(a ^ b),
                    BinaryOp::AndNot => Some(a & !b),
                    _ => return Err(invalid()),
                };
                Value::Int(result.ok_or_else(|| self.error(ctx, pos, CheckErrorKind::Overflow))?)
            }
            (a, b) => {
                let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
                    return Err(invalid());
                };
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div if b == 0.0 => {
                        return Err(self.error(ctx, pos, CheckErrorKind::DivisionByZero));
                    }
                    BinaryOp::Div => a / b,
                    _ => return Err(invalid()),
                };
                if !result.is_finite() {
                    return Err(self.error(ctx, pos, CheckErrorKind::Overflow));
                }
                Value::Float(result)
            }
        };

        Ok(Operand { typ, value })
    }

    /// Bring both operands to a common type, converting untyped constants
    fn unify(&self, ctx: Ctx, pos: Position, x: Operand, y: Operand) -> Result<(Type, Value, Value), CheckError> {
        if x.typ == y.typ {
            return Ok((x.typ, x.value, y.value));
        }

        match (x.typ.is_untyped(), y.typ.is_untyped()) {
            (true, true) => {
                let (Type::Basic(kx), Type::Basic(ky)) = (&x.typ, &y.typ) else {
                    return Err(self.mismatched(ctx, pos, &x, &y));
                };
                if !(kx.is_numeric() && ky.is_numeric()) {
                    return Err(self.mismatched(ctx, pos, &x, &y));
                }
                let kind = if kx.untyped_rank() >= ky.untyped_rank() { *kx } else { *ky };
                let (a, b) = if kind.is_float() {
                    (to_float(x.value), to_float(y.value))
                } else {
                    (x.value, y.value)
                };
                Ok((Type::Basic(kind), a, b))
            }
            (true, false) => {
                let typ = y.typ.clone();
                let x = self.assign(ctx, pos, x, &typ)?;
                Ok((typ, x.value, y.value))
            }
            (false, true) => {
                let typ = x.typ.clone();
                let y = self.assign(ctx, pos, y, &typ)?;
                Ok((typ, x.value, y.value))
            }
            (false, false) => Err(self.mismatched(ctx, pos, &x, &y)),
        }
    }

    fn mismatched(&self, ctx: Ctx, pos: Position, x: &Operand, y: &Operand) -> CheckError {
        self.error(ctx, pos, CheckErrorKind::MismatchedTypes(x.typ.to_string(), y.typ.to_string()))
    }

    fn shift(&self, ctx: Ctx, pos: Position, op: BinaryOp, x: Operand, y: Operand) -> Result<Operand, CheckError> {
        let count_is_integer = y.typ.underlying().map_or(true, |k| k.is_numeric());
        let count = y
            .value
            .as_exact_int()
            .filter(|c| *c >= 0 && count_is_integer)
            .ok_or_else(|| self.error(ctx, pos, CheckErrorKind::InvalidShift(y.value.to_string())))?;

        let lhs_is_integer = x.typ.is_untyped() || x.typ.underlying().map_or(true, |k| k.is_integer());
        let base = x.value.as_exact_int().filter(|_| lhs_is_integer).ok_or_else(|| {
            self.error(
                ctx,
                pos,
                CheckErrorKind::InvalidOperation { op: op.symbol().to_string(), operand: x.describe() },
            )
        })?;

        // An untyped left operand yields an integer constant
        let typ = match x.typ {
            Type::Basic(BasicKind::UntypedFloat) => Type::Basic(BasicKind::UntypedInt),
            other => other,
        };

        let value = if op == BinaryOp::Shl {
            if base == 0 {
                0
            } else {
                let shifted = u32::try_from(count).ok().filter(|c| *c < 127).map(|c| base << c);
                match shifted {
                    Some(v) if v >> count == base => v,
                    _ => return Err(self.error(ctx, pos, CheckErrorKind::Overflow)),
                }
            }
        } else {
            base >> count.min(127)
        };

        Ok(Operand { typ, value: Value::Int(value) })
    }
}

fn build_scope<'a>(package: &'a Package, packages: &'a [Package], by_path: &HashMap<&str, usize>) -> Scope<'a> {
    let mut scope = Scope::default();

    for (file_index, file) in package.files.iter().enumerate() {
        let mut imports = FileImports::default();
        for import in &file.ast.imports {
            let path = import.path.as_str();
            match import.name.as_ref().map(|n| n.name.as_str()) {
                Some("_") => {}
                Some(".") => imports.dot.push(path),
                Some(alias) => {
                    imports.named.insert(alias.to_string(), path);
                }
                None => {
                    let local = match by_path.get(path) {
                        Some(&dep) => packages[dep].name.clone(),
                        None => path.rsplit('/').next().unwrap_or(path).to_string(),
                    };
                    imports.named.insert(local, path);
                }
            }
        }
        scope.imports.push(imports);

        for decl in &file.ast.decls {
            match decl {
                Decl::Const(decl) => declare_consts(&mut scope, file_index, &decl.specs),
                Decl::Type(decl) => {
                    for spec in &decl.specs {
                        if !spec.name.is_blank() {
                            scope.types.insert(spec.name.name.as_str(), TypeSite { file: file_index, spec });
                        }
                    }
                }
                Decl::Skipped { .. } => {}
            }
        }
    }

    scope
}

/// Register the constants of one `const` declaration, applying implicit
/// repetition of the previous type and expression list
fn declare_consts<'a>(scope: &mut Scope<'a>, file: usize, specs: &'a [ConstSpec]) {
    let mut last: Option<&'a ConstSpec> = None;

    for (iota, spec) in specs.iter().enumerate() {
        let source = if !spec.values.is_empty() {
            last = Some(spec);
            Some(spec)
        } else if spec.typ.is_none() {
            last
        } else {
            None
        };

        for (index, ident) in spec.names.iter().enumerate() {
            let (typ, value) = match source {
                Some(src) if src.values.len() > spec.names.len() => {
                    (src.typ.as_ref(), Err(CheckErrorKind::ExtraValue))
                }
                Some(src) => match src.values.get(index) {
                    Some(expr) => (src.typ.as_ref(), Ok(expr)),
                    None => (src.typ.as_ref(), Err(CheckErrorKind::MissingValue(ident.name.clone()))),
                },
                None => (spec.typ.as_ref(), Err(CheckErrorKind::MissingValue(ident.name.clone()))),
            };

            let key = DefKey::new(file, ident);
            scope.sites.insert(key, ConstSite { file, ident, typ, value, iota: iota as i128 });
            scope.order.push(key);
            if !ident.is_blank() {
                scope.consts.insert(ident.name.as_str(), key);
            }
        }
    }
}

/// Represent a constant value as a value of the given basic type
fn represent(value: &Value, kind: BasicKind) -> Option<Value> {
    if kind.is_integer() {
        value.as_exact_int().map(Value::Int)
    } else if kind.is_float() {
        let f = value.as_f64()?;
        Some(Value::Float(if kind == BasicKind::Float32 { f64::from(f as f32) } else { f }))
    } else if kind.is_string() {
        matches!(value, Value::String(_)).then(|| value.clone())
    } else if kind.is_bool() {
        matches!(value, Value::Bool(_)).then(|| value.clone())
    } else {
        None
    }
}

fn to_float(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::Float(i as f64),
        other => other,
    }
}

fn values_equal(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::String(a), Value::String(b)) => Some(a == b),
        _ => a.compare(b).map(|ord| ord == Ordering::Equal),
    }
}
