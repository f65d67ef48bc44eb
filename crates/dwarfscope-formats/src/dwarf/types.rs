//! DWARF constant enumerations (`DW_TAG_*`, `DW_AT_*`, `DW_FORM_*`, `DW_UT_*`).

use std::fmt;

/// Declares a DWARF constant enum with an `Unknown` catch-all, a lossless
/// `From<repr>` conversion, and `Display` using the DWARF spelling.
macro_rules! dwarf_constants {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty, $prefix:literal {
            $($variant:ident = $value:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            /// A value with no name in this table (vendor extension or newer DWARF).
            Unknown($repr),
        }

        impl From<$repr> for $name {
            fn from(value: $repr) -> Self {
                match value {
                    $($value => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }
        }

        impl $name {
            /// The raw encoded value.
            pub fn value(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Unknown(value) => value,
                }
            }

            /// The DWARF name without its prefix, e.g. `subprogram`.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($text),)*
                    Self::Unknown(_) => None,
                }
            }

            /// Widens a LEB128-decoded value; values that do not fit become `Unknown(MAX)`.
            pub fn from_uleb(value: u64) -> Self {
                <$repr>::try_from(value).map(Self::from).unwrap_or(Self::Unknown(<$repr>::MAX))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(text) => write!(f, "{}{}", $prefix, text),
                    None => write!(f, "{}{:#x}", $prefix, self.value()),
                }
            }
        }
    };
}

dwarf_constants! {
    /// Debugging information entry tag.
    pub enum DwTag: u16, "DW_TAG_" {
        ArrayType = 0x01 => "array_type",
        ClassType = 0x02 => "class_type",
        EntryPoint = 0x03 => "entry_point",
        EnumerationType = 0x04 => "enumeration_type",
        FormalParameter = 0x05 => "formal_parameter",
        ImportedDeclaration = 0x08 => "imported_declaration",
        Label = 0x0a => "label",
        LexicalBlock = 0x0b => "lexical_block",
        Member = 0x0d => "member",
        PointerType = 0x0f => "pointer_type",
        ReferenceType = 0x10 => "reference_type",
        CompileUnit = 0x11 => "compile_unit",
        StringType = 0x12 => "string_type",
        StructureType = 0x13 => "structure_type",
        SubroutineType = 0x15 => "subroutine_type",
        Typedef = 0x16 => "typedef",
        UnionType = 0x17 => "union_type",
        UnspecifiedParameters = 0x18 => "unspecified_parameters",
        Variant = 0x19 => "variant",
        CommonBlock = 0x1a => "common_block",
        CommonInclusion = 0x1b => "common_inclusion",
        Inheritance = 0x1c => "inheritance",
        InlinedSubroutine = 0x1d => "inlined_subroutine",
        Module = 0x1e => "module",
        PtrToMemberType = 0x1f => "ptr_to_member_type",
        SetType = 0x20 => "set_type",
        SubrangeType = 0x21 => "subrange_type",
        WithStmt = 0x22 => "with_stmt",
        AccessDeclaration = 0x23 => "access_declaration",
        BaseType = 0x24 => "base_type",
        CatchBlock = 0x25 => "catch_block",
        ConstType = 0x26 => "const_type",
        Constant = 0x27 => "constant",
        Enumerator = 0x28 => "enumerator",
        FileType = 0x29 => "file_type",
        Friend = 0x2a => "friend",
        Namelist = 0x2b => "namelist",
        NamelistItem = 0x2c => "namelist_item",
        PackedType = 0x2d => "packed_type",
        Subprogram = 0x2e => "subprogram",
        TemplateTypeParameter = 0x2f => "template_type_parameter",
        TemplateValueParameter = 0x30 => "template_value_parameter",
        ThrownType = 0x31 => "thrown_type",
        TryBlock = 0x32 => "try_block",
        VariantPart = 0x33 => "variant_part",
        Variable = 0x34 => "variable",
        VolatileType = 0x35 => "volatile_type",
        DwarfProcedure = 0x36 => "dwarf_procedure",
        RestrictType = 0x37 => "restrict_type",
        InterfaceType = 0x38 => "interface_type",
        Namespace = 0x39 => "namespace",
        ImportedModule = 0x3a => "imported_module",
        UnspecifiedType = 0x3b => "unspecified_type",
        PartialUnit = 0x3c => "partial_unit",
        ImportedUnit = 0x3d => "imported_unit",
        Condition = 0x3f => "condition",
        SharedType = 0x40 => "shared_type",
        TypeUnit = 0x41 => "type_unit",
        RvalueReferenceType = 0x42 => "rvalue_reference_type",
        TemplateAlias = 0x43 => "template_alias",
        CoarrayType = 0x44 => "coarray_type",
        GenericSubrange = 0x45 => "generic_subrange",
        DynamicType = 0x46 => "dynamic_type",
        AtomicType = 0x47 => "atomic_type",
        CallSite = 0x48 => "call_site",
        CallSiteParameter = 0x49 => "call_site_parameter",
        SkeletonUnit = 0x4a => "skeleton_unit",
        ImmutableType = 0x4b => "immutable_type",
        GnuTemplateParameterPack = 0x4107 => "GNU_template_parameter_pack",
        GnuFormalParameterPack = 0x4108 => "GNU_formal_parameter_pack",
        GnuCallSite = 0x4109 => "GNU_call_site",
        GnuCallSiteParameter = 0x410a => "GNU_call_site_parameter",
    }
}

dwarf_constants! {
    /// Attribute name.
    pub enum DwAt: u16, "DW_AT_" {
        Sibling = 0x01 => "sibling",
        Location = 0x02 => "location",
        Name = 0x03 => "name",
        Ordering = 0x09 => "ordering",
        ByteSize = 0x0b => "byte_size",
        BitSize = 0x0d => "bit_size",
        StmtList = 0x10 => "stmt_list",
        LowPc = 0x11 => "low_pc",
        HighPc = 0x12 => "high_pc",
        Language = 0x13 => "language",
        Discr = 0x15 => "discr",
        DiscrValue = 0x16 => "discr_value",
        Visibility = 0x17 => "visibility",
        Import = 0x18 => "import",
        StringLength = 0x19 => "string_length",
        CommonReference = 0x1a => "common_reference",
        CompDir = 0x1b => "comp_dir",
        ConstValue = 0x1c => "const_value",
        ContainingType = 0x1d => "containing_type",
        DefaultValue = 0x1e => "default_value",
        Inline = 0x20 => "inline",
        IsOptional = 0x21 => "is_optional",
        LowerBound = 0x22 => "lower_bound",
        Producer = 0x25 => "producer",
        Prototyped = 0x27 => "prototyped",
        ReturnAddr = 0x2a => "return_addr",
        StartScope = 0x2c => "start_scope",
        BitStride = 0x2e => "bit_stride",
        UpperBound = 0x2f => "upper_bound",
        AbstractOrigin = 0x31 => "abstract_origin",
        Accessibility = 0x32 => "accessibility",
        AddressClass = 0x33 => "address_class",
        Artificial = 0x34 => "artificial",
        BaseTypes = 0x35 => "base_types",
        CallingConvention = 0x36 => "calling_convention",
        Count = 0x37 => "count",
        DataMemberLocation = 0x38 => "data_member_location",
        DeclColumn = 0x39 => "decl_column",
        DeclFile = 0x3a => "decl_file",
        DeclLine = 0x3b => "decl_line",
        Declaration = 0x3c => "declaration",
        DiscrList = 0x3d => "discr_list",
        Encoding = 0x3e => "encoding",
        External = 0x3f => "external",
        FrameBase = 0x40 => "frame_base",
        Friend = 0x41 => "friend",
        IdentifierCase = 0x42 => "identifier_case",
        MacroInfo = 0x43 => "macro_info",
        NamelistItem = 0x44 => "namelist_item",
        Priority = 0x45 => "priority",
        Segment = 0x46 => "segment",
        Specification = 0x47 => "specification",
        StaticLink = 0x48 => "static_link",
        Type = 0x49 => "type",
        UseLocation = 0x4a => "use_location",
        VariableParameter = 0x4b => "variable_parameter",
        Virtuality = 0x4c => "virtuality",
        VtableElemLocation = 0x4d => "vtable_elem_location",
        Allocated = 0x4e => "allocated",
        Associated = 0x4f => "associated",
        DataLocation = 0x50 => "data_location",
        ByteStride = 0x51 => "byte_stride",
        EntryPc = 0x52 => "entry_pc",
        UseUtf8 = 0x53 => "use_UTF8",
        Extension = 0x54 => "extension",
        Ranges = 0x55 => "ranges",
        Trampoline = 0x56 => "trampoline",
        CallColumn = 0x57 => "call_column",
        CallFile = 0x58 => "call_file",
        CallLine = 0x59 => "call_line",
        Description = 0x5a => "description",
        BinaryScale = 0x5b => "binary_scale",
        DecimalScale = 0x5c => "decimal_scale",
        Small = 0x5d => "small",
        DecimalSign = 0x5e => "decimal_sign",
        DigitCount = 0x5f => "digit_count",
        PictureString = 0x60 => "picture_string",
        Mutable = 0x61 => "mutable",
        ThreadsScaled = 0x62 => "threads_scaled",
        Explicit = 0x63 => "explicit",
        ObjectPointer = 0x64 => "object_pointer",
        Endianity = 0x65 => "endianity",
        Elemental = 0x66 => "elemental",
        Pure = 0x67 => "pure",
        Recursive = 0x68 => "recursive",
        Signature = 0x69 => "signature",
        MainSubprogram = 0x6a => "main_subprogram",
        DataBitOffset = 0x6b => "data_bit_offset",
        ConstExpr = 0x6c => "const_expr",
        EnumClass = 0x6d => "enum_class",
        LinkageName = 0x6e => "linkage_name",
        StringLengthBitSize = 0x6f => "string_length_bit_size",
        StringLengthByteSize = 0x70 => "string_length_byte_size",
        Rank = 0x71 => "rank",
        StrOffsetsBase = 0x72 => "str_offsets_base",
        AddrBase = 0x73 => "addr_base",
        RnglistsBase = 0x74 => "rnglists_base",
        DwoName = 0x76 => "dwo_name",
        Reference = 0x77 => "reference",
        RvalueReference = 0x78 => "rvalue_reference",
        Macros = 0x79 => "macros",
        CallAllCalls = 0x7a => "call_all_calls",
        CallAllSourceCalls = 0x7b => "call_all_source_calls",
        CallAllTailCalls = 0x7c => "call_all_tail_calls",
        CallReturnPc = 0x7d => "call_return_pc",
        CallValue = 0x7e => "call_value",
        CallOrigin = 0x7f => "call_origin",
        CallParameter = 0x80 => "call_parameter",
        CallPc = 0x81 => "call_pc",
        CallTailCall = 0x82 => "call_tail_call",
        CallTarget = 0x83 => "call_target",
        CallTargetClobbered = 0x84 => "call_target_clobbered",
        CallDataLocation = 0x85 => "call_data_location",
        CallDataValue = 0x86 => "call_data_value",
        Noreturn = 0x87 => "noreturn",
        Alignment = 0x88 => "alignment",
        ExportSymbols = 0x89 => "export_symbols",
        Deleted = 0x8a => "deleted",
        Defaulted = 0x8b => "defaulted",
        LoclistsBase = 0x8c => "loclists_base",
        MipsLinkageName = 0x2007 => "MIPS_linkage_name",
        GnuAllTailCallSites = 0x2116 => "GNU_all_tail_call_sites",
        GnuAllCallSites = 0x2117 => "GNU_all_call_sites",
        GnuDwoName = 0x2130 => "GNU_dwo_name",
        GnuRangesBase = 0x2132 => "GNU_ranges_base",
        GnuAddrBase = 0x2133 => "GNU_addr_base",
    }
}

dwarf_constants! {
    /// Attribute encoding form.
    pub enum DwForm: u16, "DW_FORM_" {
        Addr = 0x01 => "addr",
        Block2 = 0x03 => "block2",
        Block4 = 0x04 => "block4",
        Data2 = 0x05 => "data2",
        Data4 = 0x06 => "data4",
        Data8 = 0x07 => "data8",
        String = 0x08 => "string",
        Block = 0x09 => "block",
        Block1 = 0x0a => "block1",
        Data1 = 0x0b => "data1",
        Flag = 0x0c => "flag",
        Sdata = 0x0d => "sdata",
        Strp = 0x0e => "strp",
        Udata = 0x0f => "udata",
        RefAddr = 0x10 => "ref_addr",
        Ref1 = 0x11 => "ref1",
        Ref2 = 0x12 => "ref2",
        Ref4 = 0x13 => "ref4",
        Ref8 = 0x14 => "ref8",
        RefUdata = 0x15 => "ref_udata",
        Indirect = 0x16 => "indirect",
        SecOffset = 0x17 => "sec_offset",
        Exprloc = 0x18 => "exprloc",
        FlagPresent = 0x19 => "flag_present",
        Strx = 0x1a => "strx",
        Addrx = 0x1b => "addrx",
        RefSup4 = 0x1c => "ref_sup4",
        StrpSup = 0x1d => "strp_sup",
        Data16 = 0x1e => "data16",
        LineStrp = 0x1f => "line_strp",
        RefSig8 = 0x20 => "ref_sig8",
        ImplicitConst = 0x21 => "implicit_const",
        Loclistx = 0x22 => "loclistx",
        Rnglistx = 0x23 => "rnglistx",
        RefSup8 = 0x24 => "ref_sup8",
        Strx1 = 0x25 => "strx1",
        Strx2 = 0x26 => "strx2",
        Strx3 = 0x27 => "strx3",
        Strx4 = 0x28 => "strx4",
        Addrx1 = 0x29 => "addrx1",
        Addrx2 = 0x2a => "addrx2",
        Addrx3 = 0x2b => "addrx3",
        Addrx4 = 0x2c => "addrx4",
        GnuAddrIndex = 0x1f01 => "GNU_addr_index",
        GnuStrIndex = 0x1f02 => "GNU_str_index",
        GnuRefAlt = 0x1f20 => "GNU_ref_alt",
        GnuStrpAlt = 0x1f21 => "GNU_strp_alt",
    }
}

dwarf_constants! {
    /// Unit header type (DWARF 5).
    pub enum DwUt: u8, "DW_UT_" {
        Compile = 0x01 => "compile",
        Type = 0x02 => "type",
        Partial = 0x03 => "partial",
        Skeleton = 0x04 => "skeleton",
        SplitCompile = 0x05 => "split_compile",
        SplitType = 0x06 => "split_type",
    }
}
