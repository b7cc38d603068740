use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::ast::{ClassDef, Privacy, TemplateArg, TemplateParamDef, TypeRef},
    errors::errors::{Error, ErrorImpl},
    types::types::{DeclId, InternalType},
};

use super::namespace::NamespaceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub(crate) usize);

/// A generic class, kept as syntax until it is instantiated.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub namespace: NamespaceId,
    /// Imports of the file the template was written in; instances resolve
    /// their member types against these, not against the caller's.
    pub imports: Vec<NamespaceId>,
    pub privacy: Privacy,
    pub definition: Rc<ClassDef>,
    built: HashMap<String, DeclId>,
}

impl Template {
    pub fn new(
        name: &str,
        namespace: NamespaceId,
        imports: Vec<NamespaceId>,
        definition: Rc<ClassDef>,
    ) -> Self {
        Template {
            id: TemplateId(usize::MAX),
            name: name.to_string(),
            namespace,
            imports,
            privacy: definition.modifiers.privacy,
            definition,
            built: HashMap::new(),
        }
    }

    pub fn params(&self) -> &[TemplateParamDef] {
        &self.definition.template_params
    }

    pub fn check_arity(&self, received: usize) -> Result<(), Error> {
        if self.params().len() != received {
            return Err(Error::unpositioned(ErrorImpl::TemplateArity {
                template: self.name.clone(),
                expected: self.params().len(),
                received,
            }));
        }

        Ok(())
    }

    /// Resolves `arguments` against the parameter list, in parameter order.
    ///
    /// Type parameters take type arguments. Constant parameters are
    /// recognised but cannot be bound yet.
    pub fn bind<F>(&self, arguments: &[TemplateArg], mut resolve: F) -> Result<Vec<InternalType>, Error>
    where
        F: FnMut(&TypeRef) -> Result<InternalType, Error>,
    {
        self.check_arity(arguments.len())?;

        self.params()
            .iter()
            .zip(arguments.iter())
            .map(|(param, argument)| match (param, argument) {
                (TemplateParamDef::Type { .. }, TemplateArg::Type(type_ref)) => resolve(type_ref),
                (TemplateParamDef::Type { name }, TemplateArg::Constant(expr)) => Err(Error::new(
                    ErrorImpl::TypeArgumentRequired {
                        template: self.name.clone(),
                        parameter: name.clone(),
                    },
                    expr.get_position().clone(),
                )),
                (TemplateParamDef::Const { name, .. }, TemplateArg::Type(type_ref)) => Err(Error::new(
                    ErrorImpl::ConstantArgumentRequired {
                        template: self.name.clone(),
                        parameter: name.clone(),
                    },
                    type_ref.get_position().clone(),
                )),
                (TemplateParamDef::Const { name, .. }, TemplateArg::Constant(expr)) => Err(Error::new(
                    ErrorImpl::UnsupportedConstArgument {
                        template: self.name.clone(),
                        parameter: name.clone(),
                    },
                    expr.get_position().clone(),
                )),
            })
            .collect()
    }

    /// The memoization key for a list of bound arguments, e.g. `<i32, u8*>`.
    pub fn signature(arguments: &[InternalType]) -> String {
        let arguments = arguments
            .iter()
            .map(|argument| argument.to_string())
            .collect::<Vec<_>>();

        format!("<{}>", arguments.join(", "))
    }

    pub fn instance_name(&self, signature: &str) -> String {
        format!("{}{}", self.name, signature)
    }

    /// Maps each parameter name to its bound type.
    pub fn environment(&self, arguments: &[InternalType]) -> HashMap<String, InternalType> {
        self.params()
            .iter()
            .map(|param| param.name().to_string())
            .zip(arguments.iter().cloned())
            .collect()
    }

    pub fn instance(&self, signature: &str) -> Option<DeclId> {
        self.built.get(signature).copied()
    }

    pub fn record_instance(&mut self, signature: String, decl: DeclId) {
        self.built.insert(signature, decl);
    }

    pub fn instance_count(&self) -> usize {
        self.built.len()
    }
}
