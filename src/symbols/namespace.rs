use std::collections::HashMap;

use crate::{
    ast::ast::Privacy,
    errors::errors::{Error, ErrorImpl},
    types::types::DeclId,
    Position,
};

use super::{
    decls::{Function, FunctionOwner, FuncId, Global, GlobalId, TypeDecl, TypeKind},
    overload::{Callee, Candidate, OverloadList},
    template::{Template, TemplateId},
    NAMESPACE_SEPARATOR, ROOT_NAMESPACE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    pub parent: Option<NamespaceId>,
    /// Segments joined by `::`, starting with `root`.
    pub full_name: String,
    pub namespaces: HashMap<String, NamespaceId>,
    pub types: HashMap<String, DeclId>,
    pub traits: HashMap<String, DeclId>,
    pub functions: HashMap<String, OverloadList>,
    pub globals: HashMap<String, GlobalId>,
    pub templates: HashMap<String, TemplateId>,
}

impl Namespace {
    fn new(id: NamespaceId, name: &str, parent: Option<&Namespace>) -> Self {
        let full_name = match parent {
            Some(parent) => format!("{}{}{}", parent.full_name, NAMESPACE_SEPARATOR, name),
            None => name.to_string(),
        };

        Namespace {
            id,
            name: name.to_string(),
            parent: parent.map(|parent| parent.id),
            full_name,
            namespaces: HashMap::new(),
            types: HashMap::new(),
            traits: HashMap::new(),
            functions: HashMap::new(),
            globals: HashMap::new(),
            templates: HashMap::new(),
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.types.contains_key(name)
            || self.traits.contains_key(name)
            || self.templates.contains_key(name)
    }

    /// Full name of a type, function or global declared here, e.g. `root::a#Item`.
    pub fn member_name(&self, name: &str) -> String {
        format!("{}#{}", self.full_name, name)
    }
}

/// Splits a full name like `root::a::b#Item.method` into its namespace
/// path (without the root), and the member path after `#`.
pub fn parse_full_name(full_name: &str) -> (Vec<String>, Option<String>) {
    let (namespace, member) = match full_name.split_once('#') {
        Some((namespace, member)) => (namespace, Some(member.to_string())),
        None => (full_name, None),
    };

    let path = namespace
        .split(NAMESPACE_SEPARATOR)
        .skip_while(|segment| *segment == ROOT_NAMESPACE)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect();

    (path, member)
}

/// Every declaration of a compilation, addressed by id.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    namespaces: Vec<Namespace>,
    types: HashMap<DeclId, TypeDecl>,
    functions: Vec<Function>,
    globals: Vec<Global>,
    templates: Vec<Template>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            namespaces: vec![Namespace::new(NamespaceId(0), ROOT_NAMESPACE, None)],
            types: HashMap::new(),
            functions: vec![],
            globals: vec![],
            templates: vec![],
        }
    }

    pub fn root(&self) -> NamespaceId {
        NamespaceId(0)
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        &mut self.namespaces[id.0]
    }

    /// Walks `path` down from the root, creating missing namespaces.
    pub fn get_or_create_namespace(&mut self, path: &[String]) -> NamespaceId {
        let mut current = self.root();

        for segment in path {
            current = match self.namespace(current).namespaces.get(segment) {
                Some(child) => *child,
                None => {
                    let id = NamespaceId(self.namespaces.len());
                    let namespace = Namespace::new(id, segment, Some(self.namespace(current)));

                    self.namespaces.push(namespace);
                    self.namespace_mut(current)
                        .namespaces
                        .insert(segment.clone(), id);
                    id
                }
            };
        }

        current
    }

    /// Finds an existing namespace by its path below the root.
    pub fn find_namespace(&self, path: &[String]) -> Option<NamespaceId> {
        path.iter().try_fold(self.root(), |current, segment| {
            self.namespace(current).namespaces.get(segment).copied()
        })
    }

    pub fn type_decl(&self, id: DeclId) -> &TypeDecl {
        &self.types[&id]
    }

    pub fn type_decl_mut(&mut self, id: DeclId) -> &mut TypeDecl {
        self.types
            .get_mut(&id)
            .unwrap_or_else(|| panic!("type declaration {} was never registered", id.raw()))
    }

    pub fn type_decls(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.values()
    }

    /// Declares a struct, trait or enum named `name` in `namespace`.
    pub fn declare_type(
        &mut self,
        namespace: NamespaceId,
        name: &str,
        privacy: Privacy,
        kind: TypeKind,
        position: Position,
    ) -> Result<DeclId, Error> {
        let owner = self.namespace(namespace);
        if owner.is_taken(name) {
            return Err(Error::new(
                ErrorImpl::AlreadyDeclared {
                    name: owner.member_name(name),
                },
                position,
            ));
        }

        let is_trait = kind == TypeKind::Trait;
        let decl = TypeDecl::new(name, namespace, owner.member_name(name), privacy, kind, position);
        let id = decl.id;

        let owner = self.namespace_mut(namespace);
        if is_trait {
            owner.traits.insert(name.to_string(), id);
        } else {
            owner.types.insert(name.to_string(), id);
        }
        self.types.insert(id, decl);

        Ok(id)
    }

    /// Adds a declaration that is not reachable by name, such as a
    /// template instance.
    pub fn insert_anonymous_type(&mut self, decl: TypeDecl) -> DeclId {
        let id = decl.id;
        self.types.insert(id, decl);
        id
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.0]
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Registers `function` in its owner's overload list.
    ///
    /// Assigns the id and symbol name; fails if an overload with the same
    /// parameter types already exists.
    pub fn add_function(&mut self, mut function: Function) -> Result<FuncId, Error> {
        let id = FuncId(self.functions.len());
        function.id = id;
        function.symbol_name = Function::symbol_name_for(
            &function.name,
            &function.full_name,
            &function.signature,
            function.is_foreign,
            &function.attributes,
            matches!(function.owner, FunctionOwner::Namespace(_)),
        );

        let candidate = Candidate {
            signature: function.signature.clone(),
            return_type: function.return_type.clone(),
            callee: Callee::Function(id),
        };

        let table = match function.owner {
            FunctionOwner::Namespace(namespace) => &mut self.namespace_mut(namespace).functions,
            FunctionOwner::Type(decl) => self.type_decl_mut(decl).method_table_mut(function.is_static),
        };

        table
            .entry(function.name.clone())
            .or_insert_with(|| OverloadList::new(&function.name))
            .add(candidate)?;

        self.functions.push(function);
        Ok(id)
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.0]
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn declare_global(&mut self, mut global: Global) -> Result<GlobalId, Error> {
        let namespace = self.namespace(global.namespace);
        if namespace.globals.contains_key(&global.name) {
            return Err(Error::unpositioned(ErrorImpl::AlreadyDeclared {
                name: namespace.member_name(&global.name),
            }));
        }

        let id = GlobalId(self.globals.len());
        global.id = id;

        self.namespace_mut(global.namespace)
            .globals
            .insert(global.name.clone(), id);
        self.globals.push(global);

        Ok(id)
    }

    pub fn template(&self, id: TemplateId) -> &Template {
        &self.templates[id.0]
    }

    pub fn template_mut(&mut self, id: TemplateId) -> &mut Template {
        &mut self.templates[id.0]
    }

    pub fn declare_template(&mut self, mut template: Template, position: Position) -> Result<TemplateId, Error> {
        let namespace = self.namespace(template.namespace);
        if namespace.is_taken(&template.name) {
            return Err(Error::new(
                ErrorImpl::AlreadyDeclared {
                    name: namespace.member_name(&template.name),
                },
                position,
            ));
        }

        let id = TemplateId(self.templates.len());
        template.id = id;

        self.namespace_mut(template.namespace)
            .templates
            .insert(template.name.clone(), id);
        self.templates.push(template);

        Ok(id)
    }

    /// Namespaces searched for a name used in `namespace`: the namespace
    /// itself and its ancestors, innermost first.
    fn parent_chain(&self, namespace: NamespaceId) -> impl Iterator<Item = &Namespace> {
        std::iter::successors(Some(self.namespace(namespace)), |current| {
            current.parent.map(|parent| self.namespace(parent))
        })
    }

    /// Looks `name` up through the parent chain, then through the public
    /// members of `imports`.
    fn lookup<T, F, P>(&self, namespace: NamespaceId, imports: &[NamespaceId], find: F, is_public: P) -> Option<T>
    where
        F: Fn(&Namespace) -> Option<T>,
        P: Fn(&T) -> bool,
    {
        self.parent_chain(namespace).find_map(&find).or_else(|| {
            imports
                .iter()
                .filter_map(|import| find(self.namespace(*import)))
                .find(|found| is_public(found))
        })
    }

    pub fn lookup_type(&self, namespace: NamespaceId, imports: &[NamespaceId], name: &str) -> Option<DeclId> {
        self.lookup(
            namespace,
            imports,
            |candidate| candidate.types.get(name).copied(),
            |id| self.type_decl(*id).privacy == Privacy::Public,
        )
    }

    pub fn lookup_trait(&self, namespace: NamespaceId, imports: &[NamespaceId], name: &str) -> Option<DeclId> {
        self.lookup(
            namespace,
            imports,
            |candidate| candidate.traits.get(name).copied(),
            |id| self.type_decl(*id).privacy == Privacy::Public,
        )
    }

    pub fn lookup_template(&self, namespace: NamespaceId, imports: &[NamespaceId], name: &str) -> Option<TemplateId> {
        self.lookup(
            namespace,
            imports,
            |candidate| candidate.templates.get(name).copied(),
            |id| self.template(*id).privacy == Privacy::Public,
        )
    }

    pub fn lookup_global(&self, namespace: NamespaceId, imports: &[NamespaceId], name: &str) -> Option<GlobalId> {
        self.lookup(
            namespace,
            imports,
            |candidate| candidate.globals.get(name).copied(),
            |id| self.global(*id).privacy == Privacy::Public,
        )
    }

    /// The overloads of a free function. Overloads reached through an
    /// import are narrowed to the public ones.
    pub fn lookup_functions(&self, namespace: NamespaceId, imports: &[NamespaceId], name: &str) -> Option<OverloadList> {
        if let Some(list) = self
            .parent_chain(namespace)
            .find_map(|candidate| candidate.functions.get(name))
        {
            return Some(list.clone());
        }

        imports.iter().find_map(|import| {
            let list = self.namespace(*import).functions.get(name)?;
            let mut public = OverloadList::new(name);

            for candidate in list.candidates() {
                let Callee::Function(id) = candidate.callee else {
                    continue;
                };

                if self.function(id).privacy == Privacy::Public {
                    public.add(candidate.clone()).ok()?;
                }
            }

            (!public.is_empty()).then_some(public)
        })
    }
}
