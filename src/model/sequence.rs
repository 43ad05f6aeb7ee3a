use std::collections::BTreeMap;

/// Positional mass shifts for one peptide.
///
/// Position `0` is the N-terminus, positions `1..=len` are residues and
/// `len + 1` is the C-terminus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModificationSet {
    masses: BTreeMap<usize, f64>,
}

impl ModificationSet {
    /// Create an empty modification set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mass at a position, replacing any earlier value
    pub fn insert(&mut self, position: usize, mass: f64) {
        self.masses.insert(position, mass);
    }

    /// True when no position carries a mass
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Mass recorded at `position`
    pub fn get(&self, position: usize) -> Option<f64> {
        self.masses.get(&position).copied()
    }

    /// Insert bracketed mass tags into `stripped`.
    ///
    /// A residue tag follows the residue it modifies (`PE[79]PTIDE` for a
    /// mass of 79 on residue 2), the N-terminal tag is prefixed as `n[mass]`
    /// and the C-terminal tag is appended as `c[mass]`. Masses are rounded
    /// to the nearest integer.
    pub fn annotate(&self, stripped: &str) -> String {
        if self.masses.is_empty() {
            return stripped.to_string();
        }

        let length = stripped.chars().count();
        let mut annotated = String::with_capacity(stripped.len() + 8 * self.masses.len());

        if let Some(mass) = self.get(0) {
            annotated.push('n');
            push_tag(&mut annotated, mass);
        }
        for (i, residue) in stripped.chars().enumerate() {
            annotated.push(residue);
            if let Some(mass) = self.get(i + 1) {
                push_tag(&mut annotated, mass);
            }
        }
        if let Some(mass) = self.get(length + 1) {
            annotated.push('c');
            push_tag(&mut annotated, mass);
        }
        annotated
    }
}

fn push_tag(buffer: &mut String, mass: f64) {
    buffer.push('[');
    buffer.push_str(&format!("{:.0}", mass));
    buffer.push(']');
}

/// Remove every modification annotation from a sequence.
///
/// Bracketed tags are dropped together with the lowercase terminus markers.
pub fn strip_modifications(modified: &str) -> String {
    let mut stripped = String::with_capacity(modified.len());
    let mut depth = 0usize;
    for c in modified.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_ascii_lowercase() => {}
            c => stripped.push(c),
        }
    }
    stripped
}
