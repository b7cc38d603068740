//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives the
//! compilation pipeline from parsed scripts to a verified LLVM module. It
//! owns the LLVM context handles, the symbol table, the type conversion to
//! backend types and the queue of function bodies waiting to be compiled.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    path::Path,
};

use inkwell::{
    builder::Builder,
    context::Context,
    module::Module,
    passes::PassManager,
    targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetData, TargetMachine},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, PointerType, StructType},
    values::{FunctionValue, GlobalValue, PointerValue},
    AddressSpace, OptimizationLevel,
};
use tracing::info;

use crate::{
    ast::ast::Script,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    symbols::{
        decls::{FuncId, GlobalId, Signature, TypeKind},
        namespace::{NamespaceId, SymbolTable},
    },
    types::types::{DeclId, DeclRef, FunctionType as InternalFunctionType, InternalType},
};

use super::options::BuildOptions;

/// Where name lookups happen while a declaration or body is compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileContext {
    pub namespace: NamespaceId,
    pub imports: Vec<NamespaceId>,
    /// The function whose body is being compiled, if any.
    pub function: Option<FuncId>,
    /// The type whose members are being compiled, if any. Private members
    /// of this type are accessible.
    pub owner: Option<DeclId>,
    /// Template parameters bound while an instance is built.
    pub generics: HashMap<String, InternalType>,
}

impl CompileContext {
    pub fn new(namespace: NamespaceId, imports: Vec<NamespaceId>) -> Self {
        CompileContext {
            namespace,
            imports,
            function: None,
            owner: None,
            generics: HashMap::new(),
        }
    }
}

/// A method a trait requires from its implementers.
#[derive(Debug, Clone)]
pub struct TraitMethod {
    pub signature: Signature,
    pub return_type: InternalType,
    pub is_static: bool,
}

/// The main compiler structure that holds the state of the compilation process.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    pub options: BuildOptions,
    pub symbols: SymbolTable,

    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,
    pub target_machine: TargetMachine,

    /// Backend struct of every struct declaration, and of every enum that
    /// carries a payload
    pub named_structs: HashMap<DeclId, StructType<'a>>,
    pub functions: HashMap<FuncId, FunctionValue<'a>>,
    pub globals: HashMap<GlobalId, GlobalValue<'a>>,
    pub trait_methods: HashMap<DeclId, HashMap<String, Vec<TraitMethod>>>,

    /// The lookup context of whatever is being compiled right now
    pub state: CompileContext,
    /// Bodies declared but not compiled yet, with the context to compile
    /// them in
    pub pending_bodies: VecDeque<(FuncId, CompileContext)>,
}

impl fmt::Debug for Compiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("module", &self.options.module_name)
            .field("version", &self.options.version)
            .field("functions", &self.functions.len())
            .field("globals", &self.globals.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Compiler<'a> {
    /// Creates a new Compiler instance for the host target.
    ///
    /// # Arguments
    ///
    /// * `context` - Reference to the LLVM context
    /// * `options` - Module name, version, target and dependencies
    pub fn new(context: &'a Context, options: BuildOptions) -> Result<Self, Error> {
        Target::initialize_native(&InitializationConfig::default()).map_err(backend_error)?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple).map_err(|error| backend_error(error.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::Default,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| backend_error("could not create a target machine for the host"))?;

        let module = context.create_module(&options.module_name);
        module.set_triple(&target_triple);
        module.set_data_layout(&target_machine.get_target_data().get_data_layout());

        let mut symbols = SymbolTable::new();
        let root = symbols.get_or_create_namespace(&[]);

        Ok(Compiler {
            options,
            symbols,
            context,
            module,
            builder: context.create_builder(),
            target_machine,
            named_structs: HashMap::new(),
            functions: HashMap::new(),
            globals: HashMap::new(),
            trait_methods: HashMap::new(),
            state: CompileContext::new(root, vec![]),
            pending_bodies: VecDeque::new(),
        })
    }

    pub fn target_data(&self) -> TargetData {
        self.target_machine.get_target_data()
    }

    /// The textual IR of the module.
    pub fn ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Saves the current LLVM module to a file.
    ///
    /// # Arguments
    ///
    /// * `output_file` - Path where the module file should be written
    pub fn save_module_to_file(&self, output_file: &Path) -> Result<(), Error> {
        self.module.print_to_file(output_file).map_err(|error| {
            Error::unpositioned(ErrorImpl::IoError {
                message: error.to_string(),
            })
        })
    }

    /// Swaps in a new lookup context, returning the one it replaces.
    pub fn push_context(&mut self, context: CompileContext) -> CompileContext {
        std::mem::replace(&mut self.state, context)
    }

    pub fn pop_context(&mut self, previous: CompileContext) {
        self.state = previous;
    }

    /// The lookup context of a script: its namespace and its resolved imports.
    pub fn script_context(&self, script: &Script) -> Result<CompileContext, Error> {
        let namespace = self
            .symbols
            .find_namespace(&script.namespace)
            .ok_or_else(|| unknown_namespace(&script.namespace))?;

        let imports = script
            .imports
            .iter()
            .map(|path| {
                self.symbols
                    .find_namespace(path)
                    .ok_or_else(|| unknown_namespace(path))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompileContext::new(namespace, imports))
    }

    /// Converts an internal type to the backend type a value of it is
    /// stored as.
    pub fn basic_type(&self, ty: &InternalType) -> Result<BasicTypeEnum<'a>, Error> {
        let basic = match ty {
            InternalType::Void => {
                return Err(invalid_operation("`void` has no value representation"));
            }
            InternalType::Bool => self.context.bool_type().into(),
            InternalType::Int { width, .. } => self.context.custom_width_int_type(*width).into(),
            InternalType::Float { width } => match width {
                16 => self.context.f16_type().into(),
                32 => self.context.f32_type().into(),
                _ => self.context.f64_type().into(),
            },
            InternalType::AbstractInt(_) => return self.basic_type(&ty.concrete()),
            InternalType::Pointer(base) | InternalType::Reference(base) | InternalType::Array(base) => {
                self.pointer_type(base)?.into()
            }
            InternalType::Function(function) => self
                .function_type(function)?
                .ptr_type(AddressSpace::default())
                .into(),
            InternalType::Declared(decl) => self.declared_type(decl)?,
        };

        Ok(basic)
    }

    /// The backend pointer type addressing a `pointee`; `void*` is `i8*`.
    pub fn pointer_type(&self, pointee: &InternalType) -> Result<PointerType<'a>, Error> {
        if pointee.is_void() {
            return Ok(self.context.i8_type().ptr_type(AddressSpace::default()));
        }

        Ok(self.basic_type(pointee)?.ptr_type(AddressSpace::default()))
    }

    fn declared_type(&self, decl: &DeclRef) -> Result<BasicTypeEnum<'a>, Error> {
        let type_decl = self.symbols.type_decl(decl.id);

        match &type_decl.kind {
            TypeKind::Enum(layout) if !layout.has_payload() => self.basic_type(&layout.flag_type),
            TypeKind::Struct | TypeKind::Enum(_) => self
                .named_structs
                .get(&decl.id)
                .map(|struct_type| struct_type.as_basic_type_enum())
                .ok_or_else(|| backend_error(format!("no backend struct for `{}`", type_decl.full_name))),
            TypeKind::Trait => Err(invalid_operation(&format!(
                "trait `{}` has no value representation",
                type_decl.full_name
            ))),
        }
    }

    pub fn function_type(&self, function: &InternalFunctionType) -> Result<FunctionType<'a>, Error> {
        let params = function
            .params
            .iter()
            .map(|param| self.basic_type(param).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>, _>>()?;

        if function.return_type.is_void() {
            return Ok(self.context.void_type().fn_type(&params, function.is_variadic));
        }

        Ok(self
            .basic_type(&function.return_type)?
            .fn_type(&params, function.is_variadic))
    }

    /// The function the builder is currently emitting into.
    pub fn current_function_value(&self) -> Result<FunctionValue<'a>, Error> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or_else(|| backend_error("the builder is not positioned inside a function"))
    }

    /// Allocates a stack slot at the top of the current function's entry
    /// block, so the slot dominates every use regardless of where it is
    /// requested.
    pub fn entry_alloca(&self, ty: BasicTypeEnum<'a>, name: &str) -> Result<PointerValue<'a>, Error> {
        let function = self.current_function_value()?;
        let entry = function
            .get_first_basic_block()
            .ok_or_else(|| backend_error("function has no entry block"))?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(ty, name)?)
    }

    /// Fetches an LLVM intrinsic, declaring it on first use.
    pub fn intrinsic(&self, name: &str, ty: FunctionType<'a>) -> FunctionValue<'a> {
        self.module
            .get_function(name)
            .unwrap_or_else(|| self.module.add_function(name, ty, None))
    }

    /// Verifies the module and runs the optional peephole pass.
    fn run_passes(&self) -> Result<(), Error> {
        self.module
            .verify()
            .map_err(|message| backend_error(message.to_string()))?;

        if self.options.peephole {
            let pass_manager = PassManager::create(());
            pass_manager.add_instruction_combining_pass();
            pass_manager.run_on(&self.module);
        }

        Ok(())
    }

    /// Runs every pass over `scripts`.
    fn compile_scripts(&mut self, scripts: &[Script]) -> Result<(), Error> {
        for dependency in self.options.dependencies.clone() {
            self.import_dependency(&dependency)?;
        }

        info!(target: "moth::passes", module = %self.options.module_name, "declaring types");
        self.declare_types(scripts)?;

        info!(target: "moth::passes", module = %self.options.module_name, "defining types");
        self.define_types(scripts)?;

        info!(target: "moth::passes", module = %self.options.module_name, "declaring functions");
        self.declare_functions(scripts)?;

        info!(
            target: "moth::passes",
            module = %self.options.module_name,
            pending = self.pending_bodies.len(),
            "compiling bodies"
        );
        self.compile_bodies()?;

        self.run_passes()
    }
}

/// Compiles parsed scripts into one verified module.
///
/// # Arguments
///
/// * `scripts` - Every script of the module
/// * `options` - Module name, version, target and dependencies
/// * `context` - Reference to the LLVM context the module lives in
pub fn compile<'a>(scripts: &[Script], options: BuildOptions, context: &'a Context) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, options)?;
    compiler.compile_scripts(scripts)?;

    Ok(compiler)
}

/// Tokenizes, parses and compiles `(file name, source)` pairs.
pub fn compile_sources<'a>(
    sources: &[(&str, &str)],
    options: BuildOptions,
    context: &'a Context,
) -> Result<Compiler<'a>, Error> {
    let scripts = sources
        .iter()
        .map(|(file, source)| {
            let file = std::rc::Rc::new(file.to_string());
            let tokens = tokenize(source, file.clone())?;
            parse(tokens, file)
        })
        .collect::<Result<Vec<_>, _>>()?;

    compile(&scripts, options, context)
}

pub(crate) fn backend_error(message: impl ToString) -> Error {
    Error::unpositioned(ErrorImpl::BackendError {
        message: message.to_string(),
    })
}

pub(crate) fn invalid_operation(message: &str) -> Error {
    Error::unpositioned(ErrorImpl::InvalidOperation {
        message: message.to_string(),
    })
}

fn unknown_namespace(path: &[String]) -> Error {
    Error::unpositioned(ErrorImpl::UnknownNamespace {
        namespace: path.join("::"),
    })
}
