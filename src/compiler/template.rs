use tracing::debug;

use crate::{
    ast::ast::{TemplateArg, TypeRef},
    errors::errors::Error,
    symbols::{
        decls::{TypeDecl, TypeKind},
        template::{Template, TemplateId},
    },
    types::types::{DeclId, InternalType},
    Position, MK_POSITIONED_ERROR,
};

use super::compiler::{CompileContext, Compiler};

impl<'a> Compiler<'a> {
    /// Resolves a written type in the current context.
    ///
    /// Names are tried as bound template parameters, then primitives, then
    /// declared types and traits. Names with arguments instantiate a
    /// template.
    pub fn resolve_type(&mut self, type_ref: &TypeRef) -> Result<InternalType, Error> {
        let ty = match type_ref {
            TypeRef::Named {
                name,
                arguments,
                position,
            } => {
                if !arguments.is_empty() {
                    let template = self
                        .symbols
                        .lookup_template(self.state.namespace, &self.state.imports, name)
                        .ok_or_else(|| MK_POSITIONED_ERROR!(UnknownTemplate { template: name.clone() }, position))?;

                    return self
                        .instantiate(template, arguments, position)
                        .map_err(|error| error.or_at(position));
                }

                self.resolve_name(name, position)?
            }
            TypeRef::Pointer(base) => self.resolve_type(base)?.pointer_to(),
            TypeRef::Reference(base) => self.resolve_type(base)?.reference_to(),
            TypeRef::Array(base) => self.resolve_type(base)?.array_of(),
            TypeRef::Function {
                params,
                return_type,
                is_variadic,
                ..
            } => {
                let params = params
                    .iter()
                    .map(|param| self.resolve_type(param))
                    .collect::<Result<Vec<_>, _>>()?;
                let return_type = self.resolve_type(return_type)?;

                InternalType::function(return_type, params, *is_variadic)
            }
        };

        Ok(ty)
    }

    fn resolve_name(&self, name: &str, position: &Position) -> Result<InternalType, Error> {
        if let Some(bound) = self.state.generics.get(name) {
            return Ok(bound.clone());
        }

        if let Some(primitive) = InternalType::primitive(name) {
            return Ok(primitive);
        }

        let (namespace, imports) = (self.state.namespace, &self.state.imports);
        let declared = self
            .symbols
            .lookup_type(namespace, imports, name)
            .or_else(|| self.symbols.lookup_trait(namespace, imports, name));

        if let Some(id) = declared {
            return Ok(self.symbols.type_decl(id).as_type());
        }

        if let Some(template) = self.symbols.lookup_template(namespace, imports, name) {
            self.symbols
                .template(template)
                .check_arity(0)
                .map_err(|error| error.or_at(position))?;
        }

        Err(MK_POSITIONED_ERROR!(UnknownType { type_: name.to_string() }, position))
    }

    /// Returns the instance of `template` for `arguments`, building it on
    /// first use.
    ///
    /// Argument types are resolved in the caller's context; the instance's
    /// members are resolved in the template's own namespace and imports.
    /// The instance is recorded before its members are built, so a member
    /// that names the instance itself resolves to it.
    pub fn instantiate(
        &mut self,
        id: TemplateId,
        arguments: &[TemplateArg],
        position: &Position,
    ) -> Result<InternalType, Error> {
        let template = self.symbols.template(id).clone();
        let bound = template.bind(arguments, |type_ref| self.resolve_type(type_ref))?;
        let signature = Template::signature(&bound);

        if let Some(existing) = template.instance(&signature) {
            return Ok(self.symbols.type_decl(existing).as_type());
        }

        let name = template.instance_name(&signature);
        let full_name = self.symbols.namespace(template.namespace).member_name(&name);

        debug!(target: "moth::templates", template = %template.name, instance = %full_name, "instantiating");

        let mut decl = TypeDecl::new(
            &name,
            template.namespace,
            full_name.clone(),
            template.privacy,
            TypeKind::Struct,
            position.clone(),
        );
        decl.is_foreign = template.definition.modifiers.is_foreign;
        let decl_id = self.symbols.insert_anonymous_type(decl);

        self.symbols
            .template_mut(id)
            .record_instance(signature, decl_id);
        self.named_structs
            .insert(decl_id, self.context.opaque_struct_type(&full_name));

        let mut context = CompileContext::new(template.namespace, template.imports.clone());
        context.owner = Some(decl_id);
        context.generics = template.environment(&bound);

        let previous = self.push_context(context);
        let result = self.build_instance(decl_id, &template);
        self.pop_context(previous);
        result?;

        Ok(self.symbols.type_decl(decl_id).as_type())
    }

    fn build_instance(&mut self, id: DeclId, template: &Template) -> Result<(), Error> {
        let definition = template.definition.clone();

        self.define_struct(id, &definition)?;
        self.declare_methods(id, &definition.methods)
    }
}

