//! Declaration passes.
//!
//! Every script is walked once per pass, in this order:
//!
//! 1. Type names: namespaces, structs, traits, enums and templates are
//!    registered with opaque backend structs.
//! 2. Type bodies: enum layouts, struct fields and enum payload unions.
//! 3. Signatures: globals, functions, methods and trait impls, followed by
//!    the trait conformance check.
//! 4. Bodies, drained from a queue that template instantiation can append
//!    to while it runs.

use std::{collections::HashMap, rc::Rc};

use inkwell::{module::Linkage, values::BasicValue};
use tracing::debug;

use crate::{
    ast::ast::{
        ClassDef, Definition, EnumDef, ExprKind, FunctionDef, GlobalDef, ImplDef, Literal, Script,
        TraitDef, TypeRef,
    },
    errors::errors::{Error, ErrorImpl},
    symbols::{
        attributes::AttributeSet,
        decls::{
            EnumFlag, EnumLayout, FuncId, Function, FunctionOwner, FunctionState, Global, Signature,
            TypeKind,
        },
        operators::builtin_static_methods,
        template::Template,
    },
    types::types::{DeclId, InternalType},
    MK_POSITIONED_ERROR,
};

use super::{
    compiler::{invalid_operation, CompileContext, Compiler, TraitMethod},
    scope::{Scope, Variable},
    stmt::gen_block,
};

/// Name of the static method that constructs its owner.
pub const CONSTRUCTOR: &str = "init";

impl<'a> Compiler<'a> {
    /// Registers every type name so later passes can refer to types
    /// declared in any script, in any order.
    pub fn declare_types(&mut self, scripts: &[Script]) -> Result<(), Error> {
        for script in scripts {
            self.symbols.get_or_create_namespace(&script.namespace);
        }

        for script in scripts {
            let context = self.script_context(script)?;

            for definition in &script.definitions {
                match definition {
                    Definition::Class(class) if !class.template_params.is_empty() => {
                        let template = Template::new(
                            &class.name,
                            context.namespace,
                            context.imports.clone(),
                            Rc::new(class.clone()),
                        );
                        self.symbols.declare_template(template, class.span.start.clone())?;
                    }
                    Definition::Class(class) => self.declare_class(class, &context)?,
                    Definition::Enum(enum_def) => self.declare_enum(enum_def, &context)?,
                    Definition::Trait(trait_def) => {
                        self.symbols.declare_type(
                            context.namespace,
                            &trait_def.name,
                            trait_def.modifiers.privacy,
                            TypeKind::Trait,
                            trait_def.span.start.clone(),
                        )?;
                    }
                    Definition::Function(_) | Definition::Impl(_) | Definition::Global(_) => {}
                }
            }
        }

        Ok(())
    }

    fn declare_class(&mut self, class: &ClassDef, context: &CompileContext) -> Result<(), Error> {
        let attributes = AttributeSet::from_ast(&class.modifiers.attributes)?;
        let id = self.symbols.declare_type(
            context.namespace,
            &class.name,
            class.modifiers.privacy,
            TypeKind::Struct,
            class.span.start.clone(),
        )?;

        let decl = self.symbols.type_decl_mut(id);
        decl.is_foreign = class.modifiers.is_foreign;
        decl.attributes = attributes;
        let full_name = decl.full_name.clone();

        self.named_structs
            .insert(id, self.context.opaque_struct_type(&full_name));
        Ok(())
    }

    fn declare_enum(&mut self, enum_def: &EnumDef, context: &CompileContext) -> Result<(), Error> {
        let id = self.symbols.declare_type(
            context.namespace,
            &enum_def.name,
            enum_def.modifiers.privacy,
            TypeKind::Enum(EnumLayout::new(vec![])),
            enum_def.span.start.clone(),
        )?;

        if enum_def.flags.iter().any(|flag| !flag.payload.is_empty()) {
            let decl = self.symbols.type_decl_mut(id);
            decl.is_union = true;
            let union_name = format!("__internal_{}", decl.full_name);

            self.named_structs
                .insert(id, self.context.opaque_struct_type(&union_name));
        }

        Ok(())
    }

    /// Fills in enum layouts, struct fields and enum payload unions.
    pub fn define_types(&mut self, scripts: &[Script]) -> Result<(), Error> {
        let mut enums = vec![];

        for script in scripts {
            let context = self.script_context(script)?;
            let previous = self.push_context(context);

            for definition in &script.definitions {
                if let Definition::Enum(enum_def) = definition {
                    enums.push(self.define_enum(enum_def)?);
                }
            }

            self.pop_context(previous);
        }

        for script in scripts {
            let context = self.script_context(script)?;
            let previous = self.push_context(context);

            for definition in &script.definitions {
                if let Definition::Class(class) = definition {
                    if class.template_params.is_empty() {
                        let id = self.lookup_own_type(&class.name)?;
                        self.define_struct(id, class)?;
                    }
                }
            }

            self.pop_context(previous);
        }

        for id in enums {
            self.define_union_body(id)?;
        }

        Ok(())
    }

    fn lookup_own_type(&self, name: &str) -> Result<DeclId, Error> {
        self.symbols
            .namespace(self.state.namespace)
            .types
            .get(name)
            .copied()
            .ok_or_else(|| {
                Error::unpositioned(ErrorImpl::UnknownType {
                    type_: name.to_string(),
                })
            })
    }

    fn define_enum(&mut self, enum_def: &EnumDef) -> Result<DeclId, Error> {
        let id = self.lookup_own_type(&enum_def.name)?;
        let mut flags: Vec<EnumFlag> = vec![];
        let mut next_value = 0u64;

        for flag in &enum_def.flags {
            if flags.iter().any(|existing| existing.name == flag.name) {
                return Err(MK_POSITIONED_ERROR!(
                    AlreadyDeclared {
                        name: format!("{}.{}", self.symbols.type_decl(id).full_name, flag.name)
                    },
                    flag.position
                ));
            }

            let value = flag.value.unwrap_or(next_value);
            next_value = value.wrapping_add(1);

            let payload = flag
                .payload
                .iter()
                .map(|type_ref| self.resolve_type(type_ref))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| error.or_at(&flag.position))?;

            flags.push(EnumFlag {
                name: flag.name.clone(),
                value,
                payload,
            });
        }

        self.symbols.type_decl_mut(id).kind = TypeKind::Enum(EnumLayout::new(flags));
        Ok(id)
    }

    /// Resolves and lays out the fields of a struct, then gives its backend
    /// struct a body. Also used for template instances.
    pub fn define_struct(&mut self, id: DeclId, class: &ClassDef) -> Result<(), Error> {
        let mut field_types = vec![];

        for field in &class.fields {
            let ty = self
                .resolve_type(&field.type_ref)
                .map_err(|error| error.or_at(&field.position))?;
            let basic = self.basic_type(&ty).map_err(|error| error.or_at(&field.position))?;

            self.symbols
                .type_decl_mut(id)
                .add_field(&field.name, ty, field.privacy)
                .map_err(|error| error.or_at(&field.position))?;
            field_types.push(basic);
        }

        if let Some(struct_type) = self.named_structs.get(&id) {
            struct_type.set_body(&field_types, false);
        }

        self.add_builtin_statics(id);
        Ok(())
    }

    /// Gives a declared type its `sizeof` and `alignof` statics.
    pub fn add_builtin_statics(&mut self, id: DeclId) {
        let decl = self.symbols.type_decl_mut(id);
        let ty = decl.as_type();

        for list in builtin_static_methods(&ty) {
            decl.static_methods.insert(list.name.clone(), list);
        }
    }

    /// Gives a payload enum's union struct its body: the flag, then at each
    /// payload position the widest type any flag stores there.
    fn define_union_body(&mut self, id: DeclId) -> Result<(), Error> {
        let Some(layout) = self.symbols.type_decl(id).enum_layout().cloned() else {
            return Ok(());
        };
        self.add_builtin_statics(id);

        let Some(union_type) = self.named_structs.get(&id).copied() else {
            return Ok(());
        };

        let target_data = self.target_data();
        let positions = layout
            .flags
            .iter()
            .map(|flag| flag.payload.len())
            .max()
            .unwrap_or(0);

        let mut body = vec![self.basic_type(&layout.flag_type)?];
        for position in 0..positions {
            let mut widest = None;

            for flag in &layout.flags {
                let Some(ty) = flag.payload.get(position) else {
                    continue;
                };
                let basic = self.basic_type(ty)?;
                let bits = target_data.get_bit_size(&basic);

                if widest.map_or(true, |(_, widest_bits)| bits > widest_bits) {
                    widest = Some((basic, bits));
                }
            }

            if let Some((basic, _)) = widest {
                body.push(basic);
            }
        }

        union_type.set_body(&body, false);
        Ok(())
    }

    /// Declares globals, functions, methods and trait impls, then checks
    /// every impl against its trait.
    pub fn declare_functions(&mut self, scripts: &[Script]) -> Result<(), Error> {
        let mut impls = vec![];

        for script in scripts {
            let context = self.script_context(script)?;
            let previous = self.push_context(context.clone());

            for definition in &script.definitions {
                match definition {
                    Definition::Global(global) => self.declare_global(global)?,
                    Definition::Function(function) => {
                        let owner = FunctionOwner::Namespace(context.namespace);
                        self.declare_function(&Rc::new(function.clone()), owner)?;
                    }
                    Definition::Class(class) if class.template_params.is_empty() => {
                        let id = self.lookup_own_type(&class.name)?;
                        self.declare_methods(id, &class.methods)?;
                    }
                    Definition::Trait(trait_def) => self.declare_trait_methods(trait_def)?,
                    Definition::Impl(impl_def) => impls.push(self.declare_impl(impl_def)?),
                    Definition::Class(_) | Definition::Enum(_) => {}
                }
            }

            self.pop_context(previous);
        }

        for (type_id, trait_id, position) in impls {
            self.check_conformance(type_id, trait_id)
                .map_err(|error| error.or_at(&position))?;
        }

        Ok(())
    }

    fn declare_global(&mut self, definition: &GlobalDef) -> Result<(), Error> {
        let position = &definition.span.start;
        let ty = self
            .resolve_type(&definition.type_ref)
            .map_err(|error| error.or_at(position))?;
        let basic = self.basic_type(&ty).map_err(|error| error.or_at(position))?;

        let namespace = self.state.namespace;
        let full_name = self.symbols.namespace(namespace).member_name(&definition.name);

        let mut global = Global::new(&definition.name, namespace, full_name.clone(), ty.clone());
        global.privacy = definition.modifiers.privacy;
        global.is_constant = definition.is_constant;

        let id = self
            .symbols
            .declare_global(global)
            .map_err(|error| error.or_at(position))?;

        let initializer = match &definition.value {
            Some(value) => self
                .constant_initializer(&value.kind, &ty)
                .map_err(|error| error.or_at(value.get_position()))?,
            None => basic.const_zero(),
        };

        let global_value = self.module.add_global(basic, None, &full_name);
        global_value.set_initializer(&initializer);
        global_value.set_constant(definition.is_constant);
        global_value.set_linkage(Linkage::External);

        self.globals.insert(id, global_value);
        Ok(())
    }

    /// Global initialisers must be literals converting to the global's type.
    fn constant_initializer(
        &self,
        value: &ExprKind,
        ty: &InternalType,
    ) -> Result<inkwell::values::BasicValueEnum<'a>, Error> {
        let mismatch = |received: String| {
            Error::unpositioned(ErrorImpl::TypeMatchError {
                expected: ty.to_string(),
                received,
            })
        };

        let ExprKind::Literal(literal) = value else {
            return Err(invalid_operation("global initialisers must be literals"));
        };

        let constant = match (literal, ty) {
            (Literal::Int(value), InternalType::Int { width, .. }) => {
                if !InternalType::AbstractInt(*value).can_convert_to(ty) {
                    return Err(mismatch(InternalType::AbstractInt(*value).to_string()));
                }
                self.context
                    .custom_width_int_type(*width)
                    .const_int(*value as u64, true)
                    .as_basic_value_enum()
            }
            (Literal::Int(value), InternalType::Float { .. }) => self
                .basic_type(ty)?
                .into_float_type()
                .const_float(*value as f64)
                .as_basic_value_enum(),
            (Literal::Float(value), InternalType::Float { .. }) => self
                .basic_type(ty)?
                .into_float_type()
                .const_float(*value)
                .as_basic_value_enum(),
            (Literal::Bool(value), InternalType::Bool) => self
                .context
                .bool_type()
                .const_int(*value as u64, false)
                .as_basic_value_enum(),
            (Literal::Char(value), InternalType::Int { width: 8, .. }) => self
                .context
                .i8_type()
                .const_int(*value as u64, false)
                .as_basic_value_enum(),
            (Literal::Null, InternalType::Pointer(_)) => self
                .basic_type(ty)?
                .into_pointer_type()
                .const_null()
                .as_basic_value_enum(),
            (Literal::Int(value), _) => return Err(mismatch(InternalType::AbstractInt(*value).to_string())),
            (Literal::Float(_), _) => return Err(mismatch(InternalType::f32().to_string())),
            (Literal::Bool(_), _) => return Err(mismatch(InternalType::Bool.to_string())),
            (Literal::Char(_), _) => return Err(mismatch(InternalType::u8().to_string())),
            (Literal::Null, _) => return Err(mismatch(InternalType::void_pointer().to_string())),
            (Literal::String(_), _) => {
                return Err(invalid_operation("string globals are not supported"));
            }
        };

        Ok(constant)
    }

    pub fn declare_methods(&mut self, owner: DeclId, methods: &[Rc<FunctionDef>]) -> Result<(), Error> {
        for method in methods {
            self.declare_function(method, FunctionOwner::Type(owner))?;
        }

        Ok(())
    }

    /// Resolves a function's signature, registers it and declares its
    /// backend function. Bodies are queued for the last pass.
    ///
    /// Returns `None` when the function is gated out for the build's target.
    pub fn declare_function(
        &mut self,
        definition: &Rc<FunctionDef>,
        owner: FunctionOwner,
    ) -> Result<Option<FuncId>, Error> {
        let position = definition.span.start.clone();
        let attributes = AttributeSet::from_ast(&definition.modifiers.attributes)?;

        if !attributes.targets(self.options.target_os) {
            debug!(
                target: "moth::passes",
                function = %definition.name,
                target_os = %self.options.target_os,
                "skipping function gated out for this target"
            );
            return Ok(None);
        }

        let params = definition
            .params
            .iter()
            .map(|param| self.resolve_type(&param.type_ref))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| error.or_at(&position))?;
        let return_type = self
            .resolve_type(&definition.return_type)
            .map_err(|error| error.or_at(&position))?;

        let (full_name, is_static) = match owner {
            FunctionOwner::Namespace(namespace) => {
                (self.symbols.namespace(namespace).member_name(&definition.name), false)
            }
            FunctionOwner::Type(decl) => (
                format!("{}.{}", self.symbols.type_decl(decl).full_name, definition.name),
                definition.modifiers.is_static,
            ),
        };

        if let (FunctionOwner::Type(decl), true) = (owner, is_static && definition.name == CONSTRUCTOR) {
            let owner_type = self.symbols.type_decl(decl).as_type();
            if return_type != owner_type {
                return Err(MK_POSITIONED_ERROR!(
                    TypeMatchError {
                        expected: owner_type.to_string(),
                        received: return_type.to_string()
                    },
                    position
                ));
            }
        }

        let mut function = Function::new(
            &definition.name,
            owner,
            full_name,
            Signature::new(&definition.name, params, definition.is_variadic),
            return_type,
        );
        function.param_names = definition.params.iter().map(|param| param.name.clone()).collect();
        function.is_static = is_static;
        function.privacy = definition.modifiers.privacy;
        function.is_foreign = definition.modifiers.is_foreign;
        function.attributes = attributes;
        function.definition = definition.body.is_some().then(|| definition.clone());

        if function.is_foreign && definition.body.is_some() {
            return Err(invalid_operation("foreign functions cannot have a body").or_at(&position));
        }

        let has_body = function.definition.is_some();
        let id = self
            .symbols
            .add_function(function)
            .map_err(|error| error.or_at(&position))?;

        self.declare_backend_function(id)
            .map_err(|error| error.or_at(&position))?;

        if has_body {
            let mut context = self.state.clone();
            context.function = Some(id);
            context.owner = match owner {
                FunctionOwner::Type(decl) => Some(decl),
                FunctionOwner::Namespace(_) => None,
            };

            self.pending_bodies.push_back((id, context));
        }

        Ok(Some(id))
    }

    /// Adds the backend declaration of a registered function.
    pub fn declare_backend_function(&mut self, id: FuncId) -> Result<(), Error> {
        let function = self.symbols.function(id);
        let owner = match function.owner {
            FunctionOwner::Type(decl) => Some(self.symbols.type_decl(decl)),
            FunctionOwner::Namespace(_) => None,
        };

        let function_type = function.function_type(owner);
        let Some(function_type) = function_type.as_function() else {
            return Err(invalid_operation("function without a function type"));
        };
        let llvm_type = self.function_type(function_type)?;

        let function_value = self
            .module
            .add_function(&function.symbol_name, llvm_type, Some(Linkage::External));
        if let Some(convention) = function.attributes.calling_convention {
            function_value.set_call_conventions(convention);
        }

        self.functions.insert(id, function_value);
        Ok(())
    }

    fn declare_trait_methods(&mut self, definition: &TraitDef) -> Result<(), Error> {
        let position = &definition.span.start;
        let trait_id = self
            .symbols
            .namespace(self.state.namespace)
            .traits
            .get(&definition.name)
            .copied()
            .ok_or_else(|| {
                MK_POSITIONED_ERROR!(
                    UnknownTrait {
                        trait_: definition.name.clone()
                    },
                    position
                )
            })?;

        let mut methods: HashMap<String, Vec<TraitMethod>> = HashMap::new();
        for method in &definition.methods {
            let params = method
                .params
                .iter()
                .map(|param| self.resolve_type(&param.type_ref))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| error.or_at(&method.span.start))?;
            let return_type = self
                .resolve_type(&method.return_type)
                .map_err(|error| error.or_at(&method.span.start))?;

            methods.entry(method.name.clone()).or_default().push(TraitMethod {
                signature: Signature::new(&method.name, params, method.is_variadic),
                return_type,
                is_static: method.modifiers.is_static,
            });
        }

        self.trait_methods.insert(trait_id, methods);
        Ok(())
    }

    fn declare_impl(&mut self, definition: &ImplDef) -> Result<(DeclId, DeclId, crate::Position), Error> {
        let position = definition.span.start.clone();

        let trait_id = match &definition.trait_ref {
            TypeRef::Named { name, arguments, .. } if arguments.is_empty() => self
                .symbols
                .lookup_trait(self.state.namespace, &self.state.imports, name)
                .ok_or_else(|| MK_POSITIONED_ERROR!(UnknownTrait { trait_: name.clone() }, position))?,
            _ => {
                return Err(MK_POSITIONED_ERROR!(
                    InvalidOperation {
                        message: String::from("only plain trait names can be implemented")
                    },
                    position
                ))
            }
        };

        let ty = self
            .resolve_type(&definition.type_ref)
            .map_err(|error| error.or_at(&position))?;
        let Some(decl) = ty.as_declared() else {
            return Err(MK_POSITIONED_ERROR!(
                InvalidOperation {
                    message: format!("traits can only be implemented for declared types, not `{}`", ty)
                },
                position
            ));
        };
        let type_id = decl.id;

        self.declare_methods(type_id, &definition.methods)?;

        let type_decl = self.symbols.type_decl_mut(type_id);
        if !type_decl.implemented_traits.contains(&trait_id) {
            type_decl.implemented_traits.push(trait_id);
        }

        Ok((type_id, trait_id, position))
    }

    /// Every method the trait requires must exist on the type with the
    /// same parameters and return type.
    fn check_conformance(&self, type_id: DeclId, trait_id: DeclId) -> Result<(), Error> {
        let type_decl = self.symbols.type_decl(type_id);
        let trait_decl = self.symbols.type_decl(trait_id);

        let Some(required) = self.trait_methods.get(&trait_id) else {
            return Ok(());
        };

        for (name, methods) in required {
            for method in methods {
                let implemented = type_decl
                    .method_table(method.is_static)
                    .get(name)
                    .is_some_and(|list| {
                        list.candidates().iter().any(|candidate| {
                            candidate.signature.same_params(&method.signature)
                                && candidate.return_type == method.return_type
                        })
                    });

                if !implemented {
                    return Err(Error::unpositioned(ErrorImpl::MissingTraitMethod {
                        trait_: trait_decl.full_name.clone(),
                        method: format!("{}{}", name, method.signature.param_list()),
                        type_: type_decl.full_name.clone(),
                    }));
                }
            }
        }

        Ok(())
    }

    /// Compiles queued bodies until the queue is empty. Instantiating a
    /// template inside a body queues the instance's methods too.
    pub fn compile_bodies(&mut self) -> Result<(), Error> {
        while let Some((id, context)) = self.pending_bodies.pop_front() {
            let previous = self.push_context(context);
            let result = self.compile_function(id);
            self.pop_context(previous);

            result?;
        }

        Ok(())
    }

    fn compile_function(&mut self, id: FuncId) -> Result<(), Error> {
        let function = self.symbols.function(id).clone();
        let Some(definition) = function.definition.clone() else {
            return Ok(());
        };
        let Some(body) = definition.body.as_ref() else {
            return Ok(());
        };

        let function_value = self.functions[&id];
        let entry = self.context.append_basic_block(function_value, "entry");
        self.builder.position_at_end(entry);

        let mut scope = Scope::new(entry);
        let mut param_offset = 0;

        if let FunctionOwner::Type(owner) = function.owner {
            let owner_type = self.symbols.type_decl(owner).as_type();

            if !function.is_static {
                let self_pointer = function_value
                    .get_nth_param(0)
                    .ok_or_else(|| invalid_operation("method is missing its receiver"))?
                    .into_pointer_value();
                self_pointer.set_name("self");

                scope.declare(Variable {
                    name: String::from("self"),
                    ty: owner_type,
                    pointer: self_pointer,
                    is_constant: true,
                });
                param_offset = 1;
            } else if function.name == CONSTRUCTOR {
                let struct_type = self.basic_type(&owner_type)?;
                let self_pointer = self.entry_alloca(struct_type, "self")?;
                self.builder.build_store(self_pointer, struct_type.const_zero())?;

                scope.declare(Variable {
                    name: String::from("self"),
                    ty: owner_type,
                    pointer: self_pointer,
                    is_constant: true,
                });
            }
        }

        for (index, (name, ty)) in function
            .param_names
            .iter()
            .zip(function.signature.params.iter())
            .enumerate()
        {
            let value = function_value
                .get_nth_param((index + param_offset) as u32)
                .ok_or_else(|| invalid_operation("parameter count does not match the declaration"))?;
            value.set_name(name);

            let pointer = self.entry_alloca(self.basic_type(ty)?, name)?;
            self.builder.build_store(pointer, value)?;

            scope.declare(Variable {
                name: name.clone(),
                ty: ty.clone(),
                pointer,
                is_constant: false,
            });
        }

        let returns = gen_block(self, body, &mut scope)?;
        if !returns {
            return Err(MK_POSITIONED_ERROR!(
                NotGuaranteedToReturn {
                    function: function.full_name.clone()
                },
                definition.span.start
            ));
        }

        self.symbols.function_mut(id).state = FunctionState::Compiled;
        Ok(())
    }
}
