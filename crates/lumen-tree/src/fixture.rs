//! Helpers that build syntax trees in source order.
//!
//! Children are produced by closures before their parent node is inserted,
//! so the positions handed out by the [`TreeBuilder`] follow the order in
//! which the source would have been written. Comments created with
//! [`Fixture::doc`] attach to the next statement that is started.

use lumen_span::SourceId;

use crate::{
    id::Id,
    node::*,
    tree::{SyntaxTree, TreeBuilder},
};

pub struct Fixture {
    builder: TreeBuilder,
    pending: Vec<Id<Comment>>,
}

impl Fixture {
    pub fn new(source: SourceId) -> Self {
        Self {
            builder: TreeBuilder::new(source),
            pending: Vec::new(),
        }
    }

    pub fn builder(&mut self) -> &mut TreeBuilder {
        &mut self.builder
    }

    pub fn finish(mut self, stats: impl FnOnce(&mut Self) -> Vec<Stat>) -> SyntaxTree {
        let block = self.block(stats);
        let root = Source::new_in(Some(block), &mut self.builder);
        self.builder.finish(root)
    }

    pub fn block(&mut self, stats: impl FnOnce(&mut Self) -> Vec<Stat>) -> Id<Block> {
        let stats = stats(self);
        Block::new_in(stats, &mut self.builder)
    }

    fn stat<T, F>(&mut self, build: F) -> Id<T>
    where
        F: FnOnce(&mut Self) -> T,
        Node: From<T>,
        Stat: From<Id<T>>,
    {
        let comments = std::mem::take(&mut self.pending);
        let node = build(self);
        let id = self.builder.insert(node);

        if !comments.is_empty() {
            self.builder.attach_comments(id, comments);
        }

        id
    }

    // Expressions

    pub fn name(&mut self, text: &str) -> Id<Name> {
        Name::new_in(text, &mut self.builder)
    }

    fn names(&mut self, names: &[&str]) -> Vec<Id<Name>> {
        names.iter().map(|name| self.name(name)).collect()
    }

    pub fn var(&mut self, name: &str) -> Id<NameExpr> {
        NameExpr::new_in(name, &mut self.builder)
    }

    pub fn literal(&mut self, literal: Literal) -> Id<LiteralExpr> {
        LiteralExpr::new_in(literal, &mut self.builder)
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.literal(Literal::Integer(value)).into()
    }

    pub fn num(&mut self, value: f64) -> Expr {
        self.literal(Literal::Number(value)).into()
    }

    pub fn str(&mut self, text: &str) -> Expr {
        self.literal(Literal::String(text.into())).into()
    }

    pub fn nil(&mut self) -> Expr {
        self.literal(Literal::Nil).into()
    }

    pub fn vararg(&mut self) -> Expr {
        self.builder.insert(VarArgExpr).into()
    }

    /// `prefix.key`, or `prefix:key` with `colon`
    pub fn index(&mut self, prefix: impl Into<Expr>, key: &str, colon: bool) -> Id<IndexExpr> {
        let key = self.name(key);
        IndexExpr::new_in(Some(prefix.into()), Some(key.into()), colon, &mut self.builder)
    }

    /// `prefix[key]`
    pub fn bracket(&mut self, prefix: impl Into<Expr>, key: Expr) -> Id<IndexExpr> {
        IndexExpr::new_in(Some(prefix.into()), Some(key.into()), false, &mut self.builder)
    }

    pub fn call(
        &mut self,
        prefix: impl Into<Expr>,
        args: impl FnOnce(&mut Self) -> Vec<Expr>,
    ) -> Id<CallExpr> {
        let prefix = prefix.into();
        let args = args(self);
        CallExpr::new_in(Some(prefix), args, &mut self.builder)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Id<BinaryExpr> {
        BinaryExpr::new_in(op, Some(lhs), Some(rhs), &mut self.builder)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Id<UnaryExpr> {
        UnaryExpr::new_in(op, Some(operand), &mut self.builder)
    }

    pub fn paren(&mut self, inner: Expr) -> Id<ParenExpr> {
        ParenExpr::new_in(Some(inner), &mut self.builder)
    }

    pub fn closure(
        &mut self,
        params: &[&str],
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<ClosureExpr> {
        let params = self.names(params);
        let block = self.block(body);
        ClosureExpr::new_in(params, Some(block), &mut self.builder)
    }

    pub fn table(&mut self, fields: impl FnOnce(&mut Self) -> Vec<Id<TableField>>) -> Id<TableExpr> {
        let fields = fields(self);
        TableExpr::new_in(fields, &mut self.builder)
    }

    /// `key = value` inside a table constructor.
    pub fn field(&mut self, key: &str, value: impl FnOnce(&mut Self) -> Expr) -> Id<TableField> {
        let key = self.name(key);
        let value = value(self);
        TableField::new_in(Some(key.into()), Some(value), &mut self.builder)
    }

    /// `["key"] = value` inside a table constructor.
    pub fn string_field(
        &mut self,
        key: &str,
        value: impl FnOnce(&mut Self) -> Expr,
    ) -> Id<TableField> {
        let key = self.str(key);
        let value = value(self);
        TableField::new_in(Some(key.into()), Some(value), &mut self.builder)
    }

    pub fn item(&mut self, value: impl FnOnce(&mut Self) -> Expr) -> Id<TableField> {
        let value = value(self);
        TableField::new_in(None, Some(value), &mut self.builder)
    }

    // Statements

    pub fn local(
        &mut self,
        names: &[&str],
        exprs: impl FnOnce(&mut Self) -> Vec<Expr>,
    ) -> Id<LocalStat> {
        self.stat(|fx| {
            let names = fx.names(names);
            let exprs = exprs(fx);
            LocalStat { names, exprs }
        })
    }

    pub fn assign(
        &mut self,
        vars: impl FnOnce(&mut Self) -> Vec<Expr>,
        exprs: impl FnOnce(&mut Self) -> Vec<Expr>,
    ) -> Id<AssignStat> {
        self.stat(|fx| {
            let vars = vars(fx);
            let exprs = exprs(fx);
            AssignStat { vars, exprs }
        })
    }

    /// `local function name(params) body end`
    pub fn local_function(
        &mut self,
        name: &str,
        params: &[&str],
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<FuncStat> {
        self.stat(|fx| {
            let target = fx.name(name);
            let closure = fx.closure(params, body);
            FuncStat {
                target: Some(target.into()),
                closure: Some(closure),
            }
        })
    }

    /// `function name(params) body end`
    pub fn function(
        &mut self,
        name: &str,
        params: &[&str],
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<FuncStat> {
        self.stat(|fx| {
            let target = fx.var(name);
            let closure = fx.closure(params, body);
            FuncStat {
                target: Some(target.into()),
                closure: Some(closure),
            }
        })
    }

    /// `function owner.name(params) body end`, `owner:name` with `colon`
    pub fn method(
        &mut self,
        owner: &str,
        name: &str,
        colon: bool,
        params: &[&str],
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<FuncStat> {
        self.stat(|fx| {
            let prefix = fx.var(owner);
            let target = fx.index(prefix, name, colon);
            let closure = fx.closure(params, body);
            FuncStat {
                target: Some(target.into()),
                closure: Some(closure),
            }
        })
    }

    pub fn call_stat(&mut self, call: impl FnOnce(&mut Self) -> Id<CallExpr>) -> Id<CallStat> {
        self.stat(|fx| CallStat {
            call: call(fx).into(),
        })
    }

    pub fn do_block(&mut self, body: impl FnOnce(&mut Self) -> Vec<Stat>) -> Id<DoStat> {
        self.stat(|fx| DoStat {
            block: Some(fx.block(body)),
        })
    }

    pub fn while_loop(
        &mut self,
        cond: impl FnOnce(&mut Self) -> Expr,
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<WhileStat> {
        self.stat(|fx| {
            let cond = cond(fx);
            let block = fx.block(body);
            WhileStat {
                cond: Some(cond),
                block: Some(block),
            }
        })
    }

    pub fn repeat(
        &mut self,
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
        cond: impl FnOnce(&mut Self) -> Expr,
    ) -> Id<RepeatStat> {
        self.stat(|fx| {
            let block = fx.block(body);
            let cond = cond(fx);
            RepeatStat {
                block: Some(block),
                cond: Some(cond),
            }
        })
    }

    /// `if cond then body end`
    pub fn if_then(
        &mut self,
        cond: impl FnOnce(&mut Self) -> Expr,
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<IfStat> {
        self.stat(|fx| {
            let cond = cond(fx);
            let block = fx.block(body);
            let clause = IfClause::new_in(Some(cond), Some(block), &mut fx.builder);
            IfStat {
                clauses: vec![clause],
            }
        })
    }

    pub fn numeric_for(
        &mut self,
        var: &str,
        exprs: impl FnOnce(&mut Self) -> Vec<Expr>,
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<ForStat> {
        self.stat(|fx| {
            let var = fx.name(var);
            let exprs = exprs(fx);
            let block = fx.block(body);
            ForStat {
                var: Some(var),
                exprs,
                block: Some(block),
            }
        })
    }

    pub fn for_range(
        &mut self,
        names: &[&str],
        exprs: impl FnOnce(&mut Self) -> Vec<Expr>,
        body: impl FnOnce(&mut Self) -> Vec<Stat>,
    ) -> Id<ForRangeStat> {
        self.stat(|fx| {
            let names = fx.names(names);
            let exprs = exprs(fx);
            let block = fx.block(body);
            ForRangeStat {
                names,
                exprs,
                block: Some(block),
            }
        })
    }

    pub fn ret(&mut self, exprs: impl FnOnce(&mut Self) -> Vec<Expr>) -> Id<ReturnStat> {
        self.stat(|fx| ReturnStat { exprs: exprs(fx) })
    }

    pub fn label(&mut self, name: &str) -> Id<LabelStat> {
        self.stat(|fx| LabelStat {
            name: Some(fx.name(name)),
        })
    }

    pub fn goto(&mut self, label: &str) -> Id<GotoStat> {
        self.stat(|fx| GotoStat {
            label: Some(fx.name(label)),
        })
    }

    // Documentation

    /// Writes a comment that attaches to the next statement.
    pub fn doc(&mut self, tags: impl FnOnce(&mut Self) -> Vec<DocTag>) -> Id<Comment> {
        let tags = tags(self);
        let comment = Comment::new_in(tags, &mut self.builder);
        self.pending.push(comment);
        comment
    }

    /// A type written as a single name, `T[]` for arrays and `T?` for nullable.
    pub fn ty(&mut self, name: &str) -> DocType {
        if let Some(inner) = name.strip_suffix('?') {
            let inner = self.ty(inner);
            let nil = DocNameType::new_in("nil", &mut self.builder);
            return DocUnionType::new_in(vec![inner, nil.into()], &mut self.builder).into();
        }

        if let Some(elem) = name.strip_suffix("[]") {
            let elem = self.ty(elem);
            return DocArrayType::new_in(Some(elem), &mut self.builder).into();
        }

        self.type_ref(name).into()
    }

    pub fn type_ref(&mut self, name: &str) -> Id<DocNameType> {
        DocNameType::new_in(name, &mut self.builder)
    }

    fn types(&mut self, names: &[&str]) -> Vec<DocType> {
        names.iter().map(|name| self.ty(name)).collect()
    }

    pub fn union(&mut self, names: &[&str]) -> DocType {
        let types = self.types(names);
        DocUnionType::new_in(types, &mut self.builder).into()
    }

    pub fn table_type(
        &mut self,
        fields: impl FnOnce(&mut Self) -> Vec<Id<DocField>>,
    ) -> Id<DocTableType> {
        let fields = fields(self);
        DocTableType::new_in(fields, &mut self.builder)
    }

    pub fn func_type(&mut self, params: &[(&str, &str)], returns: &[&str]) -> DocType {
        let params = params
            .iter()
            .map(|&(name, ty)| {
                let name = self.name(name);
                let ty = self.ty(ty);
                DocFuncParam::new_in(Some(name), Some(ty), false, &mut self.builder)
            })
            .collect();
        let returns = self.types(returns);
        DocFuncType::new_in(params, returns, &mut self.builder).into()
    }

    pub fn class(&mut self, name: &str, supers: &[&str]) -> Id<DocClass> {
        let name = self.name(name);
        let supers = self.types(supers);
        DocClass::new_in(ClassKind::Class, Some(name), None, supers, None, &mut self.builder)
    }

    pub fn interface(&mut self, name: &str) -> Id<DocClass> {
        let name = self.name(name);
        DocClass::new_in(ClassKind::Interface, Some(name), None, vec![], None, &mut self.builder)
    }

    /// `---@class Name<T, U>`
    pub fn generic_class(&mut self, name: &str, params: &[&str]) -> Id<DocClass> {
        let name = self.name(name);
        let params = params
            .iter()
            .map(|param| {
                let param = self.name(param);
                DocGenericParam::new_in(Some(param), None, &mut self.builder)
            })
            .collect();
        let generics = DocGeneric::new_in(params, &mut self.builder);
        DocClass::new_in(
            ClassKind::Class,
            Some(name),
            Some(generics),
            vec![],
            None,
            &mut self.builder,
        )
    }

    pub fn doc_field(&mut self, name: &str, ty: &str) -> Id<DocField> {
        let key = self.name(name);
        let ty = self.ty(ty);
        DocField::new_in(Some(DocFieldKey::Name(key)), Some(ty), false, &mut self.builder)
    }

    /// `---@field [key] value`
    pub fn index_field(&mut self, key: &str, value: &str) -> Id<DocField> {
        let key = self.ty(key);
        let value = self.ty(value);
        DocField::new_in(Some(DocFieldKey::Type(key)), Some(value), false, &mut self.builder)
    }

    pub fn enumeration(&mut self, name: &str, base: Option<&str>, fields: &[&str]) -> Id<DocEnum> {
        let name = self.name(name);
        let base = base.map(|base| self.ty(base));
        let fields = self.names(fields);
        DocEnum::new_in(Some(name), base, fields, &mut self.builder)
    }

    pub fn alias(&mut self, name: &str, ty: &str) -> Id<DocAlias> {
        let name = self.name(name);
        let ty = self.ty(ty);
        DocAlias::new_in(Some(name), Some(ty), &mut self.builder)
    }

    pub fn type_tag(&mut self, types: &[&str]) -> Id<DocTypeTag> {
        let types = self.types(types);
        DocTypeTag::new_in(types, &mut self.builder)
    }

    pub fn param(&mut self, name: &str, ty: &str, nullable: bool) -> Id<DocParam> {
        let name = self.name(name);
        let ty = self.ty(ty);
        DocParam::new_in(Some(name), Some(ty), nullable, &mut self.builder)
    }

    pub fn returns(&mut self, types: &[&str]) -> Id<DocReturn> {
        let types = self.types(types);
        DocReturn::new_in(types, &mut self.builder)
    }

    pub fn generic(&mut self, params: &[&str]) -> Id<DocGeneric> {
        let params = params
            .iter()
            .map(|param| {
                let param = self.name(param);
                DocGenericParam::new_in(Some(param), None, &mut self.builder)
            })
            .collect();
        DocGeneric::new_in(params, &mut self.builder)
    }

    pub fn overload(&mut self, params: &[(&str, &str)], returns: &[&str]) -> Id<DocOverload> {
        let ty = self.func_type(params, returns);
        DocOverload::new_in(Some(ty), &mut self.builder)
    }

    pub fn operator(&mut self, op: &str, operands: &[&str], ret: &str) -> Id<DocOperator> {
        let op = self.name(op);
        let operands = self.types(operands);
        let ret = self.ty(ret);
        DocOperator::new_in(Some(op), operands, Some(ret), &mut self.builder)
    }
}
