//! SMARTS query parsing.
//!
//! Supports the subset of SMARTS used by functional group libraries: atomic
//! primitives (`#n`, element symbols, `a`, `A`, `D`, `H`, `h`, `R`, `r`, `X`, `x`,
//! `v`, charges, isotopes), the logical operators `!`, `&`, `,` and `;` with
//! their usual precedence, recursive SMARTS `$(...)`, bond primitives
//! (`-`, `=`, `#`, `:`, `~`, `@`) and ring closures. Chirality is accepted but
//! ignored.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::element;
use crate::core::molecule::{Atom, Bond, BondOrder, Molecule};

use super::MoleculeParseError;

/// A pattern string that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {position} in '{pattern}'")]
pub struct PatternSyntaxError {
    pub pattern: String,
    pub position: usize,
    pub message: String,
}

/// A single atom test
#[derive(Debug, Clone, PartialEq)]
pub enum AtomPrimitive {
    /// `*`, also used for ignored chirality
    Any,
    AtomicNum(u8),
    Aromatic,
    Aliphatic,
    /// `D<n>`: explicit connections
    Degree(u8),
    /// `H<n>`: total attached hydrogens
    TotalHCount(u8),
    /// `h<n>`: implicit hydrogens; `h` alone means at least one
    ImplicitHCount(Option<u8>),
    /// `R`, `r` or `x` without a count
    RingMember,
    /// `R<n>`: number of rings containing the atom
    RingCount(u8),
    /// `r<n>`: in a ring of this size
    RingSize(u8),
    /// `x<n>`: number of ring bonds
    RingConnectivity(u8),
    /// `X<n>`: total connections including implicit hydrogens
    Connectivity(u8),
    /// `v<n>`: total bond order
    Valence(u8),
    Charge(i8),
    Isotope(u16),
    /// `$(...)`: the atom is the first atom of a match of the inner pattern
    Recursive(Box<SmartsPattern>),
}

/// Logical combination of atom primitives
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Prim(AtomPrimitive),
    Not(Box<AtomExpr>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
}

/// A single bond test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondPrimitive {
    Single,
    Double,
    Triple,
    Aromatic,
    Any,
    Ring,
}

/// Logical combination of bond primitives
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    /// No bond symbol written: single or aromatic
    Implicit,
    Prim(BondPrimitive),
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

/// A bond between two query atoms
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBond {
    pub begin: usize,
    pub end: usize,
    pub expr: BondExpr,
}

/// A parsed SMARTS query graph
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsPattern {
    source: String,
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl SmartsPattern {
    fn new(source: &str, atoms: Vec<AtomExpr>, bonds: Vec<QueryBond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bi));
            adjacency[bond.end].push((bond.begin, bi));
        }
        Self {
            source: source.to_string(),
            atoms,
            bonds,
            adjacency,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn atoms(&self) -> &[AtomExpr] {
        &self.atoms
    }

    #[must_use]
    pub fn bonds(&self) -> &[QueryBond] {
        &self.bonds
    }

    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Query neighbors as (neighbor, bond index) pairs
    #[must_use]
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    /// Read the query as a concrete molecule.
    ///
    /// Each atom takes the first atomic number its expression names; explicit `H`
    /// counts and charges are kept, other hydrogens are filled in by valence.
    ///
    /// # Errors
    ///
    /// Returns `MoleculeParseError::UnresolvedQueryAtom` if an atom names no element.
    pub fn to_molecule(&self) -> Result<Molecule, MoleculeParseError> {
        let mut atoms = Vec::with_capacity(self.atoms.len());
        let mut explicit_h = Vec::with_capacity(self.atoms.len());

        for (index, expr) in self.atoms.iter().enumerate() {
            let facts = AtomFacts::collect(expr);
            let atomic_number = facts
                .atomic_number
                .ok_or(MoleculeParseError::UnresolvedQueryAtom { index })?;
            let mut atom = Atom::new(atomic_number)
                .aromatic(facts.aromatic)
                .with_charge(facts.charge);
            if let Some(h) = facts.hydrogens {
                atom.implicit_hydrogens = h;
            }
            explicit_h.push(facts.hydrogens.is_some());
            atoms.push(atom);
        }

        let bonds: Vec<Bond> = self
            .bonds
            .iter()
            .map(|b| {
                let both_aromatic = atoms[b.begin].aromatic && atoms[b.end].aromatic;
                Bond::new(b.begin, b.end, concrete_order(&b.expr, both_aromatic))
            })
            .collect();

        super::smiles::assign_implicit_hydrogens(&mut atoms, &bonds, &explicit_h);
        Ok(Molecule::new(atoms, bonds)?)
    }
}

/// Positive facts about an atom expression, used to read a query as a molecule
#[derive(Default)]
struct AtomFacts {
    atomic_number: Option<u8>,
    aromatic: bool,
    charge: i8,
    hydrogens: Option<u8>,
}

impl AtomFacts {
    fn collect(expr: &AtomExpr) -> Self {
        let mut facts = Self::default();
        facts.visit(expr);
        facts
    }

    fn visit(&mut self, expr: &AtomExpr) {
        match expr {
            AtomExpr::Prim(p) => match p {
                AtomPrimitive::AtomicNum(n) if self.atomic_number.is_none() => {
                    self.atomic_number = Some(*n);
                }
                AtomPrimitive::Aromatic => self.aromatic = true,
                AtomPrimitive::Charge(c) => self.charge = *c,
                AtomPrimitive::TotalHCount(h) if self.hydrogens.is_none() => {
                    self.hydrogens = Some(*h);
                }
                _ => {}
            },
            AtomExpr::And(terms) => terms.iter().for_each(|t| self.visit(t)),
            // Take the first alternative of an OR
            AtomExpr::Or(terms) => {
                if let Some(first) = terms.first() {
                    self.visit(first);
                }
            }
            AtomExpr::Not(_) => {}
        }
    }
}

fn concrete_order(expr: &BondExpr, both_aromatic: bool) -> BondOrder {
    match expr {
        BondExpr::Prim(BondPrimitive::Double) => BondOrder::Double,
        BondExpr::Prim(BondPrimitive::Triple) => BondOrder::Triple,
        BondExpr::Prim(BondPrimitive::Aromatic) => BondOrder::Aromatic,
        BondExpr::Prim(BondPrimitive::Single) => BondOrder::Single,
        BondExpr::And(terms) | BondExpr::Or(terms) => terms
            .iter()
            .map(|t| concrete_order(t, both_aromatic))
            .find(|&o| o != BondOrder::Single)
            .unwrap_or(BondOrder::Single),
        _ if both_aromatic => BondOrder::Aromatic,
        _ => BondOrder::Single,
    }
}

/// Parse a SMARTS string.
///
/// # Errors
///
/// Returns `PatternSyntaxError` describing the first problem found.
pub fn parse_smarts(pattern: &str) -> Result<SmartsPattern, PatternSyntaxError> {
    let mut parser = SmartsParser::new(pattern);
    parser.parse()?;
    parser.finish()
}

struct SmartsParser<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<BondExpr>,
    open_rings: BTreeMap<u16, (usize, Option<BondExpr>)>,
}

impl<'a> SmartsParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
            open_rings: BTreeMap::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> PatternSyntaxError {
        PatternSyntaxError {
            pattern: self.source.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse(&mut self) -> Result<(), PatternSyntaxError> {
        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(self.error("branch opened before any atom"));
                    };
                    self.bump();
                    self.branches.push(prev);
                }
                b')' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond before ')'"));
                    }
                    let Some(top) = self.branches.pop() else {
                        return Err(self.error("unbalanced ')'"));
                    };
                    self.bump();
                    self.prev = Some(top);
                }
                b'.' => {
                    if self.pending.is_some() {
                        return Err(self.error("bond before '.'"));
                    }
                    self.bump();
                    self.prev = None;
                }
                _ if is_bond_start(c) => {
                    if self.pending.is_some() {
                        return Err(self.error("two consecutive bonds"));
                    }
                    let expr = self.bond_low()?;
                    self.pending = Some(expr);
                }
                b'%' => {
                    self.bump();
                    let mut number = 0u16;
                    for _ in 0..2 {
                        match self.bump() {
                            Some(d) if d.is_ascii_digit() => {
                                number = number * 10 + u16::from(d - b'0');
                            }
                            _ => return Err(self.error("expected two digits after '%'")),
                        }
                    }
                    self.ring_closure(number)?;
                }
                b'0'..=b'9' => {
                    self.bump();
                    self.ring_closure(u16::from(c - b'0'))?;
                }
                b'[' => {
                    self.bump();
                    let expr = self.atom_low()?;
                    if self.bump() != Some(b']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.add_atom(expr)?;
                }
                b'*' => {
                    self.bump();
                    self.add_atom(AtomExpr::Prim(AtomPrimitive::Any))?;
                }
                _ if c.is_ascii_alphabetic() => {
                    let expr = self.organic_atom()?;
                    self.add_atom(expr)?;
                }
                _ => return Err(self.error(format!("unexpected character '{}'", c as char))),
            }
        }
        Ok(())
    }

    fn add_atom(&mut self, expr: AtomExpr) -> Result<(), PatternSyntaxError> {
        let index = self.atoms.len();
        self.atoms.push(expr);
        match (self.prev, self.pending.take()) {
            (Some(prev), pending) => self.bonds.push(QueryBond {
                begin: prev,
                end: index,
                expr: pending.unwrap_or(BondExpr::Implicit),
            }),
            (None, Some(_)) => return Err(self.error("bond without a preceding atom")),
            (None, None) => {}
        }
        self.prev = Some(index);
        Ok(())
    }

    fn ring_closure(&mut self, number: u16) -> Result<(), PatternSyntaxError> {
        let Some(current) = self.prev else {
            return Err(self.error("ring closure before any atom"));
        };
        let pending = self.pending.take();

        if let Some((partner, stored)) = self.open_rings.remove(&number) {
            if partner == current {
                return Err(self.error(format!("ring {number} closes on the same atom")));
            }
            let expr = pending.or(stored).unwrap_or(BondExpr::Implicit);
            self.bonds.push(QueryBond {
                begin: partner,
                end: current,
                expr,
            });
        } else {
            self.open_rings.insert(number, (current, pending));
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Err(self.error("expected an atom"));
        };
        let (number, aromatic) = match c {
            b'B' if self.peek() == Some(b'r') => {
                self.bump();
                (35, false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.bump();
                (17, false)
            }
            b'B' => (5, false),
            b'C' => (6, false),
            b'N' => (7, false),
            b'O' => (8, false),
            b'P' => (15, false),
            b'S' => (16, false),
            b'F' => (9, false),
            b'I' => (53, false),
            b'b' => (5, true),
            b'c' => (6, true),
            b'n' => (7, true),
            b'o' => (8, true),
            b'p' => (15, true),
            b's' => (16, true),
            b'a' => return Ok(AtomExpr::Prim(AtomPrimitive::Aromatic)),
            b'A' => return Ok(AtomExpr::Prim(AtomPrimitive::Aliphatic)),
            _ => {
                self.pos = start;
                return Err(self.error(format!(
                    "'{}' must be written inside brackets",
                    c as char
                )));
            }
        };
        Ok(element_expr(number, aromatic))
    }

    // Atom expression precedence, lowest first:
    //   low  = or  (';' or)*
    //   or   = and (',' and)*
    //   and  = not (('&' | juxtaposition) not)*
    //   not  = '!'* primitive

    fn atom_low(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let mut terms = vec![self.atom_or()?];
        while self.peek() == Some(b';') {
            self.bump();
            terms.push(self.atom_or()?);
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn atom_or(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let mut terms = vec![self.atom_and()?];
        while self.peek() == Some(b',') {
            self.bump();
            terms.push(self.atom_and()?);
        }
        Ok(collapse(terms, AtomExpr::Or))
    }

    fn atom_and(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let mut terms = vec![self.atom_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.bump();
                    terms.push(self.atom_not()?);
                }
                Some(b']' | b',' | b';') | None => break,
                Some(_) => terms.push(self.atom_not()?),
            }
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn atom_not(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        if self.peek() == Some(b'!') {
            self.bump();
            let inner = self.atom_not()?;
            return Ok(AtomExpr::Not(Box::new(inner)));
        }
        self.atom_primitive()
    }

    fn atom_primitive(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unterminated bracket atom"));
        };

        let prim = match c {
            b'*' => {
                self.bump();
                AtomPrimitive::Any
            }
            b'#' => {
                self.bump();
                let n = self
                    .number()
                    .ok_or_else(|| self.error("expected atomic number after '#'"))?;
                AtomPrimitive::AtomicNum(self.narrow(n)?)
            }
            b'$' => {
                self.bump();
                AtomPrimitive::Recursive(Box::new(self.recursive()?))
            }
            b'@' => {
                while matches!(self.peek(), Some(b'@' | b'?')) {
                    self.bump();
                }
                AtomPrimitive::Any
            }
            b'+' | b'-' => {
                self.bump();
                let mut magnitude = 1u32;
                if let Some(n) = self.number() {
                    magnitude = n;
                } else {
                    while self.peek() == Some(c) {
                        self.bump();
                        magnitude += 1;
                    }
                }
                let magnitude =
                    i8::try_from(magnitude).map_err(|_| self.error("charge out of range"))?;
                AtomPrimitive::Charge(if c == b'+' { magnitude } else { -magnitude })
            }
            b'0'..=b'9' => {
                let n = self.number().unwrap_or(0);
                AtomPrimitive::Isotope(
                    u16::try_from(n).map_err(|_| self.error("isotope out of range"))?,
                )
            }
            b'D' => {
                self.bump();
                AtomPrimitive::Degree(self.count_or(1)?)
            }
            b'H' => {
                self.bump();
                AtomPrimitive::TotalHCount(self.count_or(1)?)
            }
            b'h' => {
                self.bump();
                match self.number() {
                    Some(n) => AtomPrimitive::ImplicitHCount(Some(self.narrow(n)?)),
                    None => AtomPrimitive::ImplicitHCount(None),
                }
            }
            b'R' | b'r' | b'x' => {
                self.bump();
                match self.number() {
                    None => AtomPrimitive::RingMember,
                    Some(0) => {
                        return Ok(AtomExpr::Not(Box::new(AtomExpr::Prim(
                            AtomPrimitive::RingMember,
                        ))))
                    }
                    Some(n) => {
                        let n = self.narrow(n)?;
                        match c {
                            b'R' => AtomPrimitive::RingCount(n),
                            b'r' => AtomPrimitive::RingSize(n),
                            _ => AtomPrimitive::RingConnectivity(n),
                        }
                    }
                }
            }
            b'X' => {
                self.bump();
                AtomPrimitive::Connectivity(self.count_or(1)?)
            }
            b'v' => {
                self.bump();
                AtomPrimitive::Valence(self.count_or(1)?)
            }
            b'a' if self.peek_at(1) != Some(b's') => {
                self.bump();
                AtomPrimitive::Aromatic
            }
            b'A' if !self
                .peek_at(1)
                .is_some_and(|n| n.is_ascii_lowercase() && two_letter_element(b'A', n).is_some()) =>
            {
                self.bump();
                AtomPrimitive::Aliphatic
            }
            _ if c.is_ascii_alphabetic() => return self.bracket_element(),
            _ => return Err(self.error(format!("unexpected '{}' in atom", c as char))),
        };
        Ok(AtomExpr::Prim(prim))
    }

    fn bracket_element(&mut self) -> Result<AtomExpr, PatternSyntaxError> {
        let Some(c) = self.bump() else {
            return Err(self.error("expected element symbol"));
        };

        if c.is_ascii_lowercase() {
            if let Some(n) = self.peek() {
                if matches!(&[c, n], b"se" | b"as") {
                    self.bump();
                    let number = if c == b's' { 34 } else { 33 };
                    return Ok(element_expr(number, true));
                }
            }
            let number = match c {
                b'b' => 5,
                b'c' => 6,
                b'n' => 7,
                b'o' => 8,
                b'p' => 15,
                b's' => 16,
                _ => {
                    self.pos -= 1;
                    return Err(self.error(format!("'{}' is not an aromatic element", c as char)));
                }
            };
            return Ok(element_expr(number, true));
        }

        if let Some(n) = self.peek().filter(u8::is_ascii_lowercase) {
            if let Some(number) = two_letter_element(c, n) {
                self.bump();
                return Ok(element_expr(number, false));
            }
        }
        let one = [c];
        let number = std::str::from_utf8(&one)
            .ok()
            .and_then(element::by_symbol)
            .map(|e| e.atomic_number);
        match number {
            Some(n) => Ok(element_expr(n, false)),
            None => {
                self.pos -= 1;
                Err(self.error(format!("unknown element '{}'", c as char)))
            }
        }
    }

    /// Parse `( ... )` after `$` as an independent pattern
    fn recursive(&mut self) -> Result<SmartsPattern, PatternSyntaxError> {
        if self.bump() != Some(b'(') {
            return Err(self.error("expected '(' after '$'"));
        }
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.bump();
        }
        if depth != 0 {
            return Err(self.error("unterminated recursive SMARTS"));
        }
        let inner = &self.source[start..self.pos];
        self.bump(); // ')'

        parse_smarts(inner).map_err(|e| PatternSyntaxError {
            pattern: self.source.to_string(),
            position: start + e.position,
            message: format!("in recursive SMARTS: {}", e.message),
        })
    }

    // Bond expressions share the atom precedence rules.

    fn bond_low(&mut self) -> Result<BondExpr, PatternSyntaxError> {
        let mut terms = vec![self.bond_or()?];
        while self.peek() == Some(b';') {
            self.bump();
            terms.push(self.bond_or()?);
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn bond_or(&mut self) -> Result<BondExpr, PatternSyntaxError> {
        let mut terms = vec![self.bond_and()?];
        while self.peek() == Some(b',') {
            self.bump();
            terms.push(self.bond_and()?);
        }
        Ok(collapse(terms, BondExpr::Or))
    }

    fn bond_and(&mut self) -> Result<BondExpr, PatternSyntaxError> {
        let mut terms = vec![self.bond_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.bump();
                    terms.push(self.bond_not()?);
                }
                Some(c) if is_bond_start(c) => terms.push(self.bond_not()?),
                _ => break,
            }
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn bond_not(&mut self) -> Result<BondExpr, PatternSyntaxError> {
        if self.peek() == Some(b'!') {
            self.bump();
            let inner = self.bond_not()?;
            return Ok(BondExpr::Not(Box::new(inner)));
        }
        let prim = match self.bump() {
            Some(b'-' | b'/' | b'\\') => BondPrimitive::Single,
            Some(b'=') => BondPrimitive::Double,
            Some(b'#') => BondPrimitive::Triple,
            Some(b':') => BondPrimitive::Aromatic,
            Some(b'~') => BondPrimitive::Any,
            Some(b'@') => BondPrimitive::Ring,
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected a bond primitive"));
            }
        };
        Ok(BondExpr::Prim(prim))
    }

    fn number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            value = value.saturating_mul(10).saturating_add(u32::from(d - b'0'));
            self.bump();
        }
        (self.pos > start).then_some(value)
    }

    fn count_or(&mut self, default: u8) -> Result<u8, PatternSyntaxError> {
        match self.number() {
            Some(n) => self.narrow(n),
            None => Ok(default),
        }
    }

    fn narrow(&self, n: u32) -> Result<u8, PatternSyntaxError> {
        u8::try_from(n).map_err(|_| self.error(format!("value {n} out of range")))
    }

    fn finish(self) -> Result<SmartsPattern, PatternSyntaxError> {
        if self.atoms.is_empty() {
            return Err(self.error("pattern has no atoms"));
        }
        if self.pending.is_some() {
            return Err(self.error("trailing bond"));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(number) = self.open_rings.keys().next() {
            return Err(self.error(format!("unclosed ring {number}")));
        }
        Ok(SmartsPattern::new(self.source, self.atoms, self.bonds))
    }
}

fn is_bond_start(c: u8) -> bool {
    matches!(c, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'!' | b'/' | b'\\')
}

fn element_expr(atomic_number: u8, aromatic: bool) -> AtomExpr {
    AtomExpr::And(vec![
        AtomExpr::Prim(AtomPrimitive::AtomicNum(atomic_number)),
        AtomExpr::Prim(if aromatic {
            AtomPrimitive::Aromatic
        } else {
            AtomPrimitive::Aliphatic
        }),
    ])
}

fn two_letter_element(first: u8, second: u8) -> Option<u8> {
    let two = [first, second];
    std::str::from_utf8(&two)
        .ok()
        .and_then(element::by_symbol)
        .map(|e| e.atomic_number)
}

fn collapse<T>(mut terms: Vec<T>, combine: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        combine(terms)
    }
}
