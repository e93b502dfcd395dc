use std::fmt;

use rustc_hash::FxHashMap;

/// Coarse type inferred for every expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Number,
    String,
    Function,
    Object,
    Boolean,
    Unknown,
    Error,
}

impl Type {
    pub fn as_str(self) -> &'static str {
        match self {
            Type::Number => "number",
            Type::String => "string",
            Type::Function => "function",
            Type::Object => "object",
            Type::Boolean => "boolean",
            Type::Unknown => "unknown",
            Type::Error => "error",
        }
    }

    /// `number` or a type that may still turn out to be one.
    pub fn is_numeric_compatible(self) -> bool {
        matches!(self, Type::Number | Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Builtin,
}

impl SymbolKind {
    pub fn label(self) -> &'static str {
        match self {
            SymbolKind::Variable => "Variable",
            SymbolKind::Function => "Function",
            SymbolKind::Parameter => "Parameter",
            SymbolKind::Builtin => "Builtin",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub mutable: bool,
    pub scope: ScopeId,
    /// Member name to type; only builtins carry members.
    pub members: FxHashMap<String, Type>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, mutable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            mutable,
            scope: ScopeId::GLOBAL,
            members: FxHashMap::default(),
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.members.insert(name.into(), ty);
        self
    }

    pub fn member(&self, name: &str) -> Option<Type> {
        self.members.get(name).copied()
    }

    /// Member names in sorted order.
    pub fn member_names(&self) -> Vec<&str> {
        let mut names = self.members.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub label: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    symbols: Vec<Symbol>,
    index: FxHashMap<String, usize>,
}

impl Scope {
    fn new(label: impl Into<String>, parent: Option<ScopeId>) -> Self {
        Self {
            label: label.into(),
            parent,
            children: Vec::new(),
            symbols: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&slot| &self.symbols[slot])
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Arena of scopes rooted at `global`. Scope ids are creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new("global", None)],
        }
    }

    /// A fresh tree whose global scope already holds `console`.
    pub fn with_builtins() -> Self {
        let mut tree = Self::new();
        let console = Symbol::new("console", SymbolKind::Builtin, Type::Object, false)
            .with_member("log", Type::Function)
            .with_member("warn", Type::Function)
            .with_member("error", Type::Function);
        tree.define(ScopeId::GLOBAL, console);
        tree
    }

    pub fn create_child(&mut self, parent: ScopeId, label: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(label, Some(parent)));
        self.scopes[parent.0].children.push(id);
        id
    }

    /// Adds `symbol` to `scope` unless the name is already taken there, in
    /// which case the existing symbol stays and `false` is returned.
    pub fn define(&mut self, scope: ScopeId, mut symbol: Symbol) -> bool {
        let target = &mut self.scopes[scope.0];
        if target.index.contains_key(&symbol.name) {
            return false;
        }
        symbol.scope = scope;
        target.index.insert(symbol.name.clone(), target.symbols.len());
        target.symbols.push(symbol);
        true
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope.0].lookup(name)
    }

    /// Resolves `name` from `scope` outward to `global`.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(symbol) = scope.lookup(name) {
                return Some(symbol);
            }
            current = scope.parent;
        }
        None
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn label(&self, id: ScopeId) -> &str {
        &self.scopes[id.0].label
    }

    /// Scopes with their ids, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(index, scope)| (ScopeId(index), scope))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
