//! Node-kind taxonomy.
//!
//! [`SyntaxKind`] is the fixed enumeration of syntax categories a parser may
//! hand to the engine. Every kind has a stable `SCREAMING_SNAKE` name that is
//! used in configuration files, tree interchange files and structural
//! queries (`//CLASS_DEF/IDENT`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! syntax_kinds {
    ($($variant:ident => $name:literal,)*) => {
        /// A syntax category of a [`SyntaxNode`](crate::SyntaxNode).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum SyntaxKind {
            $(
                #[doc = concat!("`", $name, "`")]
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl SyntaxKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$variant,)*];

            /// Returns the stable name of this kind (e.g. `"CLASS_DEF"`).
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(SyntaxKind::$variant => $name,)*
                }
            }
        }
    };
}

syntax_kinds! {
    CompilationUnit => "COMPILATION_UNIT",
    PackageDef => "PACKAGE_DEF",
    Import => "IMPORT",
    StaticImport => "STATIC_IMPORT",
    ClassDef => "CLASS_DEF",
    InterfaceDef => "INTERFACE_DEF",
    EnumDef => "ENUM_DEF",
    RecordDef => "RECORD_DEF",
    AnnotationDef => "ANNOTATION_DEF",
    EnumConstantDef => "ENUM_CONSTANT_DEF",
    ObjBlock => "OBJBLOCK",
    MethodDef => "METHOD_DEF",
    CtorDef => "CTOR_DEF",
    CompactCtorDef => "COMPACT_CTOR_DEF",
    VariableDef => "VARIABLE_DEF",
    Parameters => "PARAMETERS",
    ParameterDef => "PARAMETER_DEF",
    Modifiers => "MODIFIERS",
    Annotations => "ANNOTATIONS",
    Annotation => "ANNOTATION",
    Type => "TYPE",
    TypeArguments => "TYPE_ARGUMENTS",
    TypeParameters => "TYPE_PARAMETERS",
    ExtendsClause => "EXTENDS_CLAUSE",
    ImplementsClause => "IMPLEMENTS_CLAUSE",
    LiteralThrows => "LITERAL_THROWS",
    Slist => "SLIST",
    Lcurly => "LCURLY",
    Rcurly => "RCURLY",
    Semi => "SEMI",
    Lparen => "LPAREN",
    Rparen => "RPAREN",
    Comma => "COMMA",
    Dot => "DOT",
    Ident => "IDENT",
    Expr => "EXPR",
    Elist => "ELIST",
    MethodCall => "METHOD_CALL",
    LiteralNew => "LITERAL_NEW",
    ArrayDeclarator => "ARRAY_DECLARATOR",
    IndexOp => "INDEX_OP",
    Lambda => "LAMBDA",
    MethodRef => "METHOD_REF",
    Assign => "ASSIGN",
    PlusAssign => "PLUS_ASSIGN",
    MinusAssign => "MINUS_ASSIGN",
    Plus => "PLUS",
    Minus => "MINUS",
    Star => "STAR",
    Div => "DIV",
    Mod => "MOD",
    Equal => "EQUAL",
    NotEqual => "NOT_EQUAL",
    Lt => "LT",
    Gt => "GT",
    Le => "LE",
    Ge => "GE",
    Land => "LAND",
    Lor => "LOR",
    Lnot => "LNOT",
    Question => "QUESTION",
    Colon => "COLON",
    PostInc => "POST_INC",
    PostDec => "POST_DEC",
    Inc => "INC",
    Dec => "DEC",
    Typecast => "TYPECAST",
    LiteralInstanceof => "LITERAL_INSTANCEOF",
    LiteralIf => "LITERAL_IF",
    LiteralElse => "LITERAL_ELSE",
    LiteralFor => "LITERAL_FOR",
    LiteralWhile => "LITERAL_WHILE",
    LiteralDo => "LITERAL_DO",
    LiteralSwitch => "LITERAL_SWITCH",
    CaseGroup => "CASE_GROUP",
    LiteralCase => "LITERAL_CASE",
    LiteralDefault => "LITERAL_DEFAULT",
    LiteralBreak => "LITERAL_BREAK",
    LiteralContinue => "LITERAL_CONTINUE",
    LiteralReturn => "LITERAL_RETURN",
    LiteralThrow => "LITERAL_THROW",
    LiteralTry => "LITERAL_TRY",
    LiteralCatch => "LITERAL_CATCH",
    LiteralFinally => "LITERAL_FINALLY",
    LiteralSynchronized => "LITERAL_SYNCHRONIZED",
    LiteralThis => "LITERAL_THIS",
    LiteralSuper => "LITERAL_SUPER",
    LiteralNull => "LITERAL_NULL",
    LiteralTrue => "LITERAL_TRUE",
    LiteralFalse => "LITERAL_FALSE",
    LiteralPublic => "LITERAL_PUBLIC",
    LiteralProtected => "LITERAL_PROTECTED",
    LiteralPrivate => "LITERAL_PRIVATE",
    LiteralStatic => "LITERAL_STATIC",
    Final => "FINAL",
    Abstract => "ABSTRACT",
    LiteralVoid => "LITERAL_VOID",
    LiteralInt => "LITERAL_INT",
    LiteralBoolean => "LITERAL_BOOLEAN",
    StringLiteral => "STRING_LITERAL",
    CharLiteral => "CHAR_LITERAL",
    NumInt => "NUM_INT",
    NumLong => "NUM_LONG",
    NumFloat => "NUM_FLOAT",
    NumDouble => "NUM_DOUBLE",
    TextBlockContent => "TEXT_BLOCK_CONTENT",
    SingleLineComment => "SINGLE_LINE_COMMENT",
    BlockCommentBegin => "BLOCK_COMMENT_BEGIN",
    BlockCommentEnd => "BLOCK_COMMENT_END",
    CommentContent => "COMMENT_CONTENT",
}

// KindSet is a u128 bitset indexed by discriminant.
const _: () = assert!(SyntaxKind::ALL.len() <= 128);

impl SyntaxKind {
    /// Number of kinds in the taxonomy.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this kind in [`SyntaxKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether nodes of this kind expose their text as the `@text` query attribute.
    ///
    /// Only identifiers, literals and comment content carry meaningful text;
    /// for structural kinds the raw text is just the keyword or punctuation.
    #[must_use]
    pub const fn has_text_attribute(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::StringLiteral
                | Self::CharLiteral
                | Self::NumInt
                | Self::NumLong
                | Self::NumFloat
                | Self::NumDouble
                | Self::TextBlockContent
                | Self::CommentContent
        )
    }

    /// Whether this kind is a comment node.
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(
            self,
            Self::SingleLineComment
                | Self::BlockCommentBegin
                | Self::BlockCommentEnd
                | Self::CommentContent
        )
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a kind name is not part of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown syntax kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for SyntaxKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A set of [`SyntaxKind`]s.
///
/// Iteration is always in declaration order, so anything built from a
/// `KindSet` is deterministic.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u128);

impl KindSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates a set from a slice of kinds.
    #[must_use]
    pub const fn of(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u128;
        let mut i = 0;
        while i < kinds.len() {
            bits |= 1u128 << kinds[i].index();
            i += 1;
        }
        Self(bits)
    }

    /// Returns a copy of this set with `kind` added.
    #[must_use]
    pub const fn with(self, kind: SyntaxKind) -> Self {
        Self(self.0 | (1u128 << kind.index()))
    }

    /// Adds a kind to the set.
    pub fn insert(&mut self, kind: SyntaxKind) {
        self.0 |= 1u128 << kind.index();
    }

    /// Whether `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: SyntaxKind) -> bool {
        self.0 & (1u128 << kind.index()) != 0
    }

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Kinds in `self` that are not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether every kind in `self` is also in `other`.
    #[must_use]
    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of kinds in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the kinds in declaration order.
    pub fn iter(self) -> impl Iterator<Item = SyntaxKind> {
        SyntaxKind::ALL
            .iter()
            .copied()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<SyntaxKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = SyntaxKind>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(SyntaxKind::name)).finish()
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(SyntaxKind::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
