// Error code registry for the semantic analyser.
//
// This module defines stable, documented error codes used throughout the
// analyser. Error codes are versioned and should not be removed or
// reassigned once released.
//
// Code ranges:
// - E01xx: Lookup errors (name resolution)
// - E02xx: Type errors (type system)
// - E03xx: Shape errors (lvalue/pointer/callable/arity)
// - E04xx: Control-flow errors (break/continue/goto/label)
// - E05xx: Defer errors (nested defer, escaping transfer, too many defers)
// - E06xx: Const errors (write to const, uninitialised const)
// - E07xx: Cycle errors (alias loops)
// - E08xx: Overflow errors (enum value overflow, indirection depth)
// - E09xx: Unused-declaration warnings

use super::Severity;
use serde::{Deserialize, Serialize};

/// Category of error for grouping and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// E01xx - Name lookup errors
    Lookup,
    /// E02xx - Type errors
    Type,
    /// E03xx - Shape errors
    Shape,
    /// E04xx - Control-flow errors
    ControlFlow,
    /// E05xx - Defer-placement errors
    Defer,
    /// E06xx - Const-correctness errors
    Const,
    /// E07xx - Cyclic alias errors
    Cycle,
    /// E08xx - Overflow / bounded-recursion errors
    Overflow,
    /// E09xx - Unused-declaration warnings
    Unused,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lookup => "lookup",
            Category::Type => "type",
            Category::Shape => "shape",
            Category::ControlFlow => "control_flow",
            Category::Defer => "defer",
            Category::Const => "const",
            Category::Cycle => "cycle",
            Category::Overflow => "overflow",
            Category::Unused => "unused",
        }
    }

    /// Returns the error code prefix for this category
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Category::Lookup => "E01",
            Category::Type => "E02",
            Category::Shape => "E03",
            Category::ControlFlow => "E04",
            Category::Defer => "E05",
            Category::Const => "E06",
            Category::Cycle => "E07",
            Category::Overflow => "E08",
            Category::Unused => "E09",
        }
    }
}

/// A stable, documented error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    /// The code string, e.g., "E0101"
    pub code: &'static str,
    /// Human-readable name, e.g., "unknown_identifier"
    pub name: &'static str,
    /// Category for grouping
    pub category: Category,
    /// Default severity (can be overridden by configuration)
    pub default_severity: Severity,
    /// Brief explanation for --explain support
    pub explanation: &'static str,
}

impl ErrorCode {
    pub const fn new(
        code: &'static str,
        name: &'static str,
        category: Category,
        default_severity: Severity,
        explanation: &'static str,
    ) -> Self {
        Self {
            code,
            name,
            category,
            default_severity,
            explanation,
        }
    }
}

// ============================================================================
// Lookup errors (E01xx)
// ============================================================================

pub const E0101: ErrorCode = ErrorCode::new(
    "E0101",
    "unknown_identifier",
    Category::Lookup,
    Severity::Error,
    "An identifier does not resolve to any declaration visible at this point.",
);

pub const E0102: ErrorCode = ErrorCode::new(
    "E0102",
    "unknown_package",
    Category::Lookup,
    Severity::Error,
    "A `use` names a package that is not present in the resolved package map.",
);

pub const E0103: ErrorCode = ErrorCode::new(
    "E0103",
    "duplicate_use",
    Category::Lookup,
    Severity::Error,
    "The same package alias was registered more than once in this file.",
);

pub const E0104: ErrorCode = ErrorCode::new(
    "E0104",
    "private_access",
    Category::Lookup,
    Severity::Error,
    "A declaration outside the current package was referenced but is not public.",
);

pub const E0105: ErrorCode = ErrorCode::new(
    "E0105",
    "name_collision",
    Category::Lookup,
    Severity::Error,
    "A name was inserted into a scope frame that already binds that name.",
);

pub const E0106: ErrorCode = ErrorCode::new(
    "E0106",
    "unknown_member",
    Category::Lookup,
    Severity::Error,
    "A struct or enum member expression names a member that does not exist.",
);

pub const E0107: ErrorCode = ErrorCode::new(
    "E0107",
    "unknown_array_value_target",
    Category::Lookup,
    Severity::Error,
    "A standalone array-value declaration's target name does not resolve to any variable declared in this file.",
);

// ============================================================================
// Type errors (E02xx)
// ============================================================================

pub const E0201: ErrorCode = ErrorCode::new(
    "E0201",
    "incompatible_types",
    Category::Type,
    Severity::Error,
    "Two canonical types were required to match (or be convertible) but are not.",
);

pub const E0202: ErrorCode = ErrorCode::new(
    "E0202",
    "narrowing_conversion",
    Category::Type,
    Severity::Error,
    "An implicit conversion would lose information (narrow the value's range).",
);

pub const E0203: ErrorCode = ErrorCode::new(
    "E0203",
    "not_assignable",
    Category::Type,
    Severity::Error,
    "The right-hand side's type cannot be assigned to the left-hand side's type.",
);

pub const E0204: ErrorCode = ErrorCode::new(
    "E0204",
    "public_depends_on_private",
    Category::Type,
    Severity::Error,
    "A public declaration's type mentions a declaration that is not public.",
);

pub const E0205: ErrorCode = ErrorCode::new(
    "E0205",
    "wrong_operand_type",
    Category::Type,
    Severity::Error,
    "A unary or binary operator was applied to an operand of an unsupported type.",
);

// ============================================================================
// Shape errors (E03xx)
// ============================================================================

pub const E0301: ErrorCode = ErrorCode::new(
    "E0301",
    "not_an_lvalue",
    Category::Shape,
    Severity::Error,
    "An expression that requires an addressable location is not one.",
);

pub const E0302: ErrorCode = ErrorCode::new(
    "E0302",
    "not_a_pointer",
    Category::Shape,
    Severity::Error,
    "The dereference operator was applied to a non-pointer type.",
);

pub const E0303: ErrorCode = ErrorCode::new(
    "E0303",
    "not_callable",
    Category::Shape,
    Severity::Error,
    "A call expression's callee does not resolve to a function declaration.",
);

pub const E0304: ErrorCode = ErrorCode::new(
    "E0304",
    "arity_mismatch",
    Category::Shape,
    Severity::Error,
    "A call supplies a different number of arguments than the callee declares.",
);

pub const E0305: ErrorCode = ErrorCode::new(
    "E0305",
    "not_indexable",
    Category::Shape,
    Severity::Error,
    "A subscript expression's base is neither an array nor a pointer.",
);

pub const E0306: ErrorCode = ErrorCode::new(
    "E0306",
    "not_an_array_target",
    Category::Shape,
    Severity::Error,
    "A standalone array-value declaration's target variable is not array-typed.",
);

pub const E0307: ErrorCode = ErrorCode::new(
    "E0307",
    "invalid_array_designator",
    Category::Shape,
    Severity::Error,
    "An array initialiser list used a field designator instead of an index designator.",
);

// ============================================================================
// Control-flow errors (E04xx)
// ============================================================================

pub const E0401: ErrorCode = ErrorCode::new(
    "E0401",
    "break_outside_loop",
    Category::ControlFlow,
    Severity::Error,
    "A `break` appears with no lexically enclosing loop or switch.",
);

pub const E0402: ErrorCode = ErrorCode::new(
    "E0402",
    "continue_outside_loop",
    Category::ControlFlow,
    Severity::Error,
    "A `continue` appears with no lexically enclosing loop.",
);

pub const E0403: ErrorCode = ErrorCode::new(
    "E0403",
    "unresolved_goto",
    Category::ControlFlow,
    Severity::Error,
    "A `goto` names a label that does not exist anywhere in the function body.",
);

pub const E0404: ErrorCode = ErrorCode::new(
    "E0404",
    "duplicate_label",
    Category::ControlFlow,
    Severity::Error,
    "Two labels with the same name were declared in the same function body.",
);

pub const E0405: ErrorCode = ErrorCode::new(
    "E0405",
    "jump_into_protected_scope",
    Category::ControlFlow,
    Severity::Error,
    "A `goto` would jump into a scope containing a defer not active at the source.",
);

pub const E0406: ErrorCode = ErrorCode::new(
    "E0406",
    "switch_multiple_default",
    Category::ControlFlow,
    Severity::Error,
    "A `switch` statement declares more than one `default` case.",
);

pub const E0407: ErrorCode = ErrorCode::new(
    "E0407",
    "non_exhaustive_enum_switch",
    Category::ControlFlow,
    Severity::Warning,
    "A `switch` over an enum value does not cover every enum constant and has no default.",
);

// ============================================================================
// Defer errors (E05xx)
// ============================================================================

pub const E0501: ErrorCode = ErrorCode::new(
    "E0501",
    "nested_defer",
    Category::Defer,
    Severity::Error,
    "A `defer` statement appears inside the body of another defer statement.",
);

pub const E0502: ErrorCode = ErrorCode::new(
    "E0502",
    "escaping_transfer_in_defer",
    Category::Defer,
    Severity::Error,
    "A defer body contains a return, goto, labelled jump, break, or continue that escapes it.",
);

pub const E0503: ErrorCode = ErrorCode::new(
    "E0503",
    "too_many_defers",
    Category::Defer,
    Severity::Error,
    "The number of live defer entries reached the implementation bound (MAX_DEFERS).",
);

pub const E0504: ErrorCode = ErrorCode::new(
    "E0504",
    "defer_outside_compound",
    Category::Defer,
    Severity::Error,
    "A `defer` statement appears somewhere other than directly inside a compound statement.",
);

// ============================================================================
// Const errors (E06xx)
// ============================================================================

pub const E0601: ErrorCode = ErrorCode::new(
    "E0601",
    "write_to_const",
    Category::Const,
    Severity::Error,
    "An assignment targets a const-qualified lvalue.",
);

pub const E0602: ErrorCode = ErrorCode::new(
    "E0602",
    "uninitialized_const_var",
    Category::Const,
    Severity::Error,
    "A variable declared `const` has no initialiser.",
);

// ============================================================================
// Cycle errors (E07xx)
// ============================================================================

pub const E0701: ErrorCode = ErrorCode::new(
    "E0701",
    "cyclic_alias",
    Category::Cycle,
    Severity::Error,
    "A chain of type aliases transitively refers back to its own starting declaration.",
);

// ============================================================================
// Overflow / bounded-recursion errors (E08xx)
// ============================================================================

pub const E0801: ErrorCode = ErrorCode::new(
    "E0801",
    "enum_value_overflow",
    Category::Overflow,
    Severity::Error,
    "An explicit enum constant value exceeds the range of the enum's implementation type.",
);

pub const E0802: ErrorCode = ErrorCode::new(
    "E0802",
    "struct_indirection_depth_exceeded",
    Category::Overflow,
    Severity::Error,
    "A chain of nested struct-function member expressions exceeded MAX_STRUCT_INDIRECTION_DEPTH.",
);

pub const E0803: ErrorCode = ErrorCode::new(
    "E0803",
    "duplicate_enum_constant",
    Category::Overflow,
    Severity::Error,
    "Two constants in the same enum declaration evaluate to the same value.",
);

// ============================================================================
// Unused-declaration warnings (E09xx)
// ============================================================================

pub const E0901: ErrorCode = ErrorCode::new(
    "E0901",
    "unused_package",
    Category::Unused,
    Severity::Warning,
    "A `use` declaration was never referenced through a package-qualified lookup.",
);

pub const E0902: ErrorCode = ErrorCode::new(
    "E0902",
    "unused_variable",
    Category::Unused,
    Severity::Warning,
    "A variable declaration was never read or written after its declaration.",
);

pub const E0903: ErrorCode = ErrorCode::new(
    "E0903",
    "unused_function",
    Category::Unused,
    Severity::Warning,
    "A function declaration (other than `main`) was never called.",
);

pub const E0904: ErrorCode = ErrorCode::new(
    "E0904",
    "unused_type",
    Category::Unused,
    Severity::Warning,
    "A type declaration was never referenced by any other declaration.",
);

pub const E0905: ErrorCode = ErrorCode::new(
    "E0905",
    "unused_public",
    Category::Unused,
    Severity::Warning,
    "A public type declaration was referenced only privately within its own package.",
);

pub const E0906: ErrorCode = ErrorCode::new(
    "E0906",
    "unused_struct_member",
    Category::Unused,
    Severity::Warning,
    "A member of a struct or union declaration was never accessed.",
);

/// Look up an error code by its string form (e.g. "E0101")
pub fn lookup(code: &str) -> Option<&'static ErrorCode> {
    match code {
        "E0101" => Some(&E0101),
        "E0102" => Some(&E0102),
        "E0103" => Some(&E0103),
        "E0104" => Some(&E0104),
        "E0105" => Some(&E0105),
        "E0106" => Some(&E0106),
        "E0107" => Some(&E0107),
        "E0201" => Some(&E0201),
        "E0202" => Some(&E0202),
        "E0203" => Some(&E0203),
        "E0204" => Some(&E0204),
        "E0205" => Some(&E0205),
        "E0301" => Some(&E0301),
        "E0302" => Some(&E0302),
        "E0303" => Some(&E0303),
        "E0304" => Some(&E0304),
        "E0305" => Some(&E0305),
        "E0306" => Some(&E0306),
        "E0307" => Some(&E0307),
        "E0401" => Some(&E0401),
        "E0402" => Some(&E0402),
        "E0403" => Some(&E0403),
        "E0404" => Some(&E0404),
        "E0405" => Some(&E0405),
        "E0406" => Some(&E0406),
        "E0407" => Some(&E0407),
        "E0501" => Some(&E0501),
        "E0502" => Some(&E0502),
        "E0503" => Some(&E0503),
        "E0504" => Some(&E0504),
        "E0601" => Some(&E0601),
        "E0602" => Some(&E0602),
        "E0701" => Some(&E0701),
        "E0801" => Some(&E0801),
        "E0802" => Some(&E0802),
        "E0803" => Some(&E0803),
        "E0901" => Some(&E0901),
        "E0902" => Some(&E0902),
        "E0903" => Some(&E0903),
        "E0904" => Some(&E0904),
        "E0905" => Some(&E0905),
        "E0906" => Some(&E0906),
        _ => None,
    }
}

/// Get all error codes for a category
pub fn by_category(category: Category) -> Vec<&'static ErrorCode> {
    let all = [
        &E0101, &E0102, &E0103, &E0104, &E0105, &E0106, &E0107,
        &E0201, &E0202, &E0203, &E0204, &E0205,
        &E0301, &E0302, &E0303, &E0304, &E0305, &E0306, &E0307,
        &E0401, &E0402, &E0403, &E0404, &E0405, &E0406, &E0407,
        &E0501, &E0502, &E0503, &E0504,
        &E0601, &E0602,
        &E0701,
        &E0801, &E0802, &E0803,
        &E0901, &E0902, &E0903, &E0904, &E0905, &E0906,
    ];
    all.into_iter().filter(|c| c.category == category).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("E0701").map(|c| c.name), Some("cyclic_alias"));
        assert_eq!(lookup("E9999"), None);
    }

    #[test]
    fn test_category_codes() {
        let control_flow = by_category(Category::ControlFlow);
        assert!(control_flow.iter().all(|c| c.category == Category::ControlFlow));
        assert!(control_flow.len() >= 6);
    }

    #[test]
    fn test_code_format() {
        for code in by_category(Category::Defer) {
            assert!(code.code.starts_with("E05"));
        }
        for code in by_category(Category::Cycle) {
            assert!(code.code.starts_with("E07"));
        }
    }
}
