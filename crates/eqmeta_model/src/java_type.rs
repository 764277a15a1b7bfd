//! Declared field types and collection-type recognition.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Collection and map types recognized out of the box, by erased qualified name.
const COMMON_COLLECTION_TYPES: &[&str] = &[
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
    "java.util.SortedSet",
    "java.util.NavigableSet",
    "java.util.Queue",
    "java.util.Deque",
    "java.util.Map",
    "java.util.SortedMap",
    "java.util.NavigableMap",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Vector",
    "java.util.Stack",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.TreeSet",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.TreeMap",
    "java.util.Hashtable",
    "java.util.ArrayDeque",
    "java.util.PriorityQueue",
];

/// Deepest type-argument nesting the parser accepts.
pub const MAX_TYPE_NESTING: usize = 32;

/// Primitive type keywords.
const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

/// A declared type: an erased qualified name, type arguments, and array depth.
///
/// Parsed from and displayed as source-like text, e.g.
/// `java.util.Map<java.lang.String, java.util.List<com.example.Item>>[]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JavaType {
    name: String,
    type_args: Vec<TypeArg>,
    array_dims: u8,
}

/// One argument of a parameterized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArg {
    /// A concrete type such as `com.example.Item`.
    Type(JavaType),
    /// `?`, optionally bounded.
    Wildcard(Option<WildcardBound>),
}

/// The bound of a wildcard argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    /// `? extends T`
    Extends(Box<JavaType>),
    /// `? super T`
    Super(Box<JavaType>),
}

impl TypeArg {
    /// The concrete type, or `None` for a wildcard.
    pub fn as_type(&self) -> Option<&JavaType> {
        match self {
            TypeArg::Type(ty) => Some(ty),
            TypeArg::Wildcard(_) => None,
        }
    }

    /// Returns `true` for `?`, bounded or not.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeArg::Wildcard(_))
    }
}

impl From<JavaType> for TypeArg {
    fn from(ty: JavaType) -> Self {
        TypeArg::Type(ty)
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(ty) => write!(f, "{ty}"),
            TypeArg::Wildcard(None) => f.write_str("?"),
            TypeArg::Wildcard(Some(WildcardBound::Extends(ty))) => write!(f, "? extends {ty}"),
            TypeArg::Wildcard(Some(WildcardBound::Super(ty))) => write!(f, "? super {ty}"),
        }
    }
}

impl JavaType {
    /// Creates a non-generic, non-array type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_args: Vec::new(),
            array_dims: 0,
        }
    }

    /// Returns this type with the given type arguments.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeArg>,
    {
        self.type_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns an array type with this type as its element.
    pub fn into_array(mut self) -> Self {
        self.array_dims = self.array_dims.saturating_add(1);
        self
    }

    /// The erased qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unqualified name (text after the last `.`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// The type arguments, empty for raw or non-generic types.
    pub fn type_args(&self) -> &[TypeArg] {
        &self.type_args
    }

    /// Number of array dimensions (`0` for non-array types).
    pub fn array_dims(&self) -> u8 {
        self.array_dims
    }

    /// Returns `true` if this is an array type of any depth.
    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// Returns `true` for the eight primitive keywords (arrays of primitives are not primitive).
    pub fn is_primitive(&self) -> bool {
        !self.is_array() && PRIMITIVES.contains(&self.name.as_str())
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.type_args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Error produced when type text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type '{input}' at offset {offset}: {reason}")]
pub struct TypeParseError {
    /// The text being parsed.
    pub input: String,
    /// Byte offset of the failure.
    pub offset: usize,
    /// Description of what was expected.
    pub reason: &'static str,
}

impl FromStr for JavaType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let ty = parser.parse_type(0)?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for JavaType {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JavaType> for String {
    fn from(ty: JavaType) -> Self {
        ty.to_string()
    }
}

/// Recursive-descent parser for type text.
struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, reason: &'static str) -> TypeParseError {
        TypeParseError {
            input: self.src.to_string(),
            offset: self.pos,
            reason,
        }
    }

    /// Scans an identifier-like run (letters, digits, `_`, `$`, `.`).
    fn word(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        &src[start..self.pos]
    }

    fn parse_type(&mut self, depth: usize) -> Result<JavaType, TypeParseError> {
        if depth > MAX_TYPE_NESTING {
            return Err(self.error("type arguments nested too deeply"));
        }
        self.skip_ws();
        let name = self.word();
        if name.is_empty() {
            return Err(self.error("expected type name"));
        }
        if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
            return Err(self.error("empty segment in qualified name"));
        }

        let mut ty = JavaType::new(name);

        self.skip_ws();
        if self.eat('<') {
            loop {
                let arg = self.parse_arg(depth + 1)?;
                ty.type_args.push(arg);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }

        loop {
            self.skip_ws();
            if !self.eat('[') {
                break;
            }
            self.skip_ws();
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            ty.array_dims = ty
                .array_dims
                .checked_add(1)
                .ok_or_else(|| self.error("too many array dimensions"))?;
        }

        Ok(ty)
    }

    fn parse_arg(&mut self, depth: usize) -> Result<TypeArg, TypeParseError> {
        self.skip_ws();
        if !self.eat('?') {
            return self.parse_type(depth).map(TypeArg::Type);
        }
        self.skip_ws();
        let start = self.pos;
        let bound = match self.word() {
            "" => return Ok(TypeArg::Wildcard(None)),
            "extends" => WildcardBound::Extends(Box::new(self.parse_type(depth)?)),
            "super" => WildcardBound::Super(Box::new(self.parse_type(depth)?)),
            _ => {
                self.pos = start;
                return Err(self.error("expected 'extends' or 'super' after '?'"));
            }
        };
        Ok(TypeArg::Wildcard(Some(bound)))
    }
}

/// The set of types treated as collection-like by field selection.
///
/// Matching is on the erased qualified name, so `java.util.List<Foo>` and a raw
/// `java.util.List` are both collections. Arrays are recognized separately via
/// [`JavaType::is_array`].
#[derive(Debug, Clone)]
pub struct CollectionTypes {
    names: HashSet<String>,
}

impl CollectionTypes {
    /// An empty recognizer that treats nothing as a collection.
    pub fn none() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Adds further qualified names to the recognized set.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if `ty` is a non-array type whose erased name is recognized.
    pub fn is_collection(&self, ty: &JavaType) -> bool {
        !ty.is_array() && self.names.contains(ty.name())
    }

    /// Returns `true` if the qualified name is recognized.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

impl Default for CollectionTypes {
    fn default() -> Self {
        Self::none().with_extra(COMMON_COLLECTION_TYPES.iter().copied())
    }
}
