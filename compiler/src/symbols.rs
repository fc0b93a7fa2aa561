// symbols.rs — Cross-pass symbol tables
//
// Owning maps keyed by short identifiers, lifetimes tied to one transpile
// call (language spec §9 design note: "Symbol tables with explicit
// ownership" replaces the source's fixed-size arrays + `strdup`).
//
// Preconditions: each table starts empty at `SymbolTables::default()`.
// Postconditions: a table is only read by passes documented downstream of
//   the pass that writes it (language spec §3 table).
// Failure modes: none — reads of a missing key return `None`/empty, callers
//   decide whether that is an error.
// Side effects: none.

use std::collections::HashMap;

/// `Name -> Name_t`, written by P7 (struct transform), read by P10 (name
/// replacement) and P9 (method transform, for `self`'s parameter type).
#[derive(Debug, Default, Clone)]
pub struct StructMap {
    entries: HashMap<String, String>,
}

impl StructMap {
    pub fn insert(&mut self, base_name: impl Into<String>, typedef_name: impl Into<String>) {
        self.entries.insert(base_name.into(), typedef_name.into());
    }

    pub fn typedef_name(&self, base_name: &str) -> Option<&str> {
        self.entries.get(base_name).map(String::as_str)
    }

    pub fn contains(&self, base_name: &str) -> bool {
        self.entries.contains_key(base_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Ordered parameter list for one function, keyed by function name. Written
/// by a scan in P15 (before label validation), read by P15 itself.
#[derive(Debug, Default, Clone)]
pub struct FunctionSignatures {
    entries: HashMap<String, Vec<(String, String)>>,
}

impl FunctionSignatures {
    pub fn insert(&mut self, name: impl Into<String>, params: Vec<(String, String)>) {
        self.entries.insert(name.into(), params);
    }

    pub fn params(&self, name: &str) -> Option<&[(String, String)]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}

/// `enum Name { members... }`, written by the scanning half of P4, read by
/// the exhaustiveness-check half of P4 and by P12 (enum transform).
#[derive(Debug, Default, Clone)]
pub struct EnumTable {
    entries: HashMap<String, EnumInfo>,
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    /// Member names in declaration order.
    pub members: Vec<String>,
    /// Source line the enum was declared on (for diagnostics).
    pub line: usize,
}

impl EnumTable {
    pub fn insert(&mut self, name: impl Into<String>, members: Vec<String>, line: usize) {
        self.entries
            .insert(name.into(), EnumInfo { members, line });
    }

    pub fn get(&self, name: &str) -> Option<&EnumInfo> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EnumInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Find the enum (if any) that declares `member` among its members.
    /// Used by the enum/switch validator when case labels are bare
    /// (`case RED:`) rather than scoped (`case Color.RED:`).
    pub fn owner_of(&self, member: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, info)| info.members.iter().any(|m| m == member))
            .map(|(name, _)| name.as_str())
    }
}

/// `{ debug_mode: bool }`, default `true`. Written by P1 (pragma parse) and
/// the `--release` CLI flag; read by the runtime writer.
#[derive(Debug, Clone, Copy)]
pub struct PragmaContext {
    pub debug_mode: bool,
}

impl Default for PragmaContext {
    fn default() -> Self {
        Self { debug_mode: true }
    }
}

/// Monotonic counter for generated `_cz_cleanup_<v>_<n>` function names,
/// reset per translation unit. Owned and mutated only by P17.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferCounter(usize);

impl DeferCounter {
    pub fn next(&mut self) -> usize {
        let n = self.0;
        self.0 += 1;
        n
    }
}

/// Monotonic counter for generated `_cz_unused_<n>` identifiers, reset per
/// translation unit. Owned and mutated only by P20.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnusedCounter(usize);

impl UnusedCounter {
    pub fn next(&mut self) -> usize {
        let n = self.0;
        self.0 += 1;
        n
    }
}

/// All diagnostics for the current transpile accumulate their own
/// `Vec<Diagnostic>` in the pipeline; this table holds only the generated
/// C text for cleanup functions, written incrementally by P17 and read once
/// by the emitter.
#[derive(Debug, Default, Clone)]
pub struct GeneratedCleanupFns {
    buffer: String,
}

impl GeneratedCleanupFns {
    pub fn push(&mut self, function_text: &str) {
        self.buffer.push_str(function_text);
        self.buffer.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Every cross-pass table the transpiler owns, constructed empty and
/// threaded as `&mut SymbolTables` alongside `&mut Tree` into every pass.
#[derive(Debug, Default, Clone)]
pub struct SymbolTables {
    pub struct_map: StructMap,
    pub function_signatures: FunctionSignatures,
    pub enum_table: EnumTable,
    pub pragma_ctx: PragmaContext,
    pub defer_counter: DeferCounter,
    pub unused_counter: UnusedCounter,
    pub generated_cleanup_fns: GeneratedCleanupFns,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_map_round_trip() {
        let mut m = StructMap::default();
        m.insert("Vec2", "Vec2_t");
        assert_eq!(m.typedef_name("Vec2"), Some("Vec2_t"));
        assert_eq!(m.typedef_name("Vec3"), None);
    }

    #[test]
    fn counters_are_monotonic_and_independent() {
        let mut tables = SymbolTables::default();
        assert_eq!(tables.defer_counter.next(), 0);
        assert_eq!(tables.defer_counter.next(), 1);
        assert_eq!(tables.unused_counter.next(), 0);
    }

    #[test]
    fn pragma_defaults_to_debug_on() {
        assert!(PragmaContext::default().debug_mode);
    }
}
