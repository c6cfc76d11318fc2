//! Deterministic 2D layout for molecules without coordinates.
//!
//! Atoms are first placed along a breadth-first tree with zig-zag chains, then
//! relaxed with a spring model so ring closures come out as near-regular polygons.
//! Disconnected fragments are placed side by side.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::time::Instant;

use crate::core::molecule::Molecule;

/// Target bond length in layout units
const BOND_LENGTH: f64 = 1.0;

/// Relaxation passes
const ITERATIONS: usize = 250;

/// Non-bonded atoms closer than this push each other apart
const REPULSION_RANGE: f64 = 1.8;

/// Gap between fragments
const FRAGMENT_GAP: f64 = 1.5;

/// The layout ran past its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTimeout;

/// 2D positions for every atom, in molecule order.
///
/// Coordinates carried by the molecule are returned unchanged.
///
/// # Errors
///
/// Returns `LayoutTimeout` if `deadline` passes during relaxation.
pub fn compute_layout(molecule: &Molecule, deadline: Option<Instant>) -> Result<Vec<[f64; 2]>, LayoutTimeout> {
    if let Some(coords) = molecule.coordinates() {
        return Ok(coords.to_vec());
    }

    let n = molecule.atom_count();
    let mut positions = vec![[0.0, 0.0]; n];
    let mut placed = vec![false; n];
    let mut x_offset = 0.0;

    for root in 0..n {
        if placed[root] {
            continue;
        }
        let component = place_tree(molecule, root, &mut positions, &mut placed);
        relax(molecule, &component, &mut positions, deadline)?;

        let (min_x, max_x) = component
            .iter()
            .map(|&a| positions[a][0])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
        let shift = x_offset - min_x;
        for &a in &component {
            positions[a][0] += shift;
        }
        x_offset += (max_x - min_x) + FRAGMENT_GAP;
    }

    Ok(positions)
}

/// Breadth-first placement of one fragment; returns its atoms
fn place_tree(
    molecule: &Molecule,
    root: usize,
    positions: &mut [[f64; 2]],
    placed: &mut [bool],
) -> Vec<usize> {
    let mut heading = vec![0.0f64; positions.len()];
    let mut component = Vec::new();
    let mut queue = VecDeque::from([root]);
    placed[root] = true;
    positions[root] = [0.0, 0.0];

    while let Some(atom) = queue.pop_front() {
        component.push(atom);

        let mut children: Vec<usize> = molecule
            .neighbors(atom)
            .iter()
            .map(|&(n, _)| n)
            .filter(|&n| !placed[n])
            .collect();
        children.sort_unstable();

        let angles = child_angles(atom == root, heading[atom], children.len(), component.len());
        for (child, angle) in children.into_iter().zip(angles) {
            placed[child] = true;
            heading[child] = angle;
            positions[child] = [
                positions[atom][0] + BOND_LENGTH * angle.cos(),
                positions[atom][1] + BOND_LENGTH * angle.sin(),
            ];
            queue.push_back(child);
        }
    }
    component
}

fn child_angles(is_root: bool, heading: f64, count: usize, visit: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if is_root {
        let step = 2.0 * PI / count_to_f64(count);
        return (0..count).map(|i| -PI / 6.0 + step * count_to_f64(i)).collect();
    }
    if count == 1 {
        // Zig-zag chains
        let turn = if visit % 2 == 0 { PI / 3.0 } else { -PI / 3.0 };
        return vec![heading + turn];
    }
    let spread = (2.0 * PI / 3.0).max(PI / 2.0 * count_to_f64(count - 1) / 2.0);
    let step = spread / count_to_f64(count - 1);
    (0..count)
        .map(|i| heading - spread / 2.0 + step * count_to_f64(i))
        .collect()
}

/// Spring relaxation of one fragment
fn relax(
    molecule: &Molecule,
    component: &[usize],
    positions: &mut [[f64; 2]],
    deadline: Option<Instant>,
) -> Result<(), LayoutTimeout> {
    if component.len() < 3 {
        return Ok(());
    }

    let mut in_component = vec![false; positions.len()];
    for &a in component {
        in_component[a] = true;
    }

    let mut forces = vec![[0.0f64; 2]; positions.len()];
    for iteration in 0..ITERATIONS {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(LayoutTimeout);
            }
        }

        for &a in component {
            forces[a] = [0.0, 0.0];
        }

        for bond in molecule.bonds() {
            if !in_component[bond.begin] {
                continue;
            }
            let (delta, dist) = separation(positions, bond.begin, bond.end);
            let pull = (dist - BOND_LENGTH) * 0.5;
            apply(&mut forces, bond.begin, bond.end, delta, dist, pull);
        }

        for (i, &a) in component.iter().enumerate() {
            for &b in &component[i + 1..] {
                if molecule.bond_between(a, b).is_some() {
                    continue;
                }
                let (delta, dist) = separation(positions, a, b);
                if dist < REPULSION_RANGE {
                    let push = -(REPULSION_RANGE - dist) * 0.3;
                    apply(&mut forces, a, b, delta, dist, push);
                }
            }
        }

        let cooling = 1.0 - count_to_f64(iteration) / count_to_f64(ITERATIONS);
        for &a in component {
            let [fx, fy] = forces[a];
            let magnitude = fx.hypot(fy);
            let limit = 0.2 * cooling + 0.01;
            let scale = if magnitude > limit { limit / magnitude } else { 1.0 };
            positions[a][0] += fx * scale;
            positions[a][1] += fy * scale;
        }
    }
    Ok(())
}

fn separation(positions: &[[f64; 2]], a: usize, b: usize) -> ([f64; 2], f64) {
    let mut delta = [positions[b][0] - positions[a][0], positions[b][1] - positions[a][1]];
    let mut dist = delta[0].hypot(delta[1]);
    if dist < 1e-6 {
        // Coincident atoms: separate along a direction fixed by their indices
        let angle = count_to_f64(a * 7 + b * 13) * 0.618;
        delta = [angle.cos() * 1e-3, angle.sin() * 1e-3];
        dist = 1e-3;
    }
    (delta, dist)
}

/// Move `a` toward `b` (positive strength) or away from it (negative)
fn apply(forces: &mut [[f64; 2]], a: usize, b: usize, delta: [f64; 2], dist: f64, strength: f64) {
    let fx = delta[0] / dist * strength;
    let fy = delta[1] / dist * strength;
    forces[a][0] += fx;
    forces[a][1] += fy;
    forces[b][0] -= fx;
    forces[b][1] -= fy;
}

fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::smiles::parse_smiles;

    fn distance(p: &[[f64; 2]], a: usize, b: usize) -> f64 {
        (p[a][0] - p[b][0]).hypot(p[a][1] - p[b][1])
    }

    #[test]
    fn test_layout_is_deterministic() {
        let mol = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let first = compute_layout(&mol, None).unwrap();
        let second = compute_layout(&mol, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), mol.atom_count());
    }

    #[test]
    fn test_bonds_have_reasonable_length() {
        let mol = parse_smiles("c1ccccc1CCO").unwrap();
        let positions = compute_layout(&mol, None).unwrap();
        for bond in mol.bonds() {
            let d = distance(&positions, bond.begin, bond.end);
            assert!(d > 0.4 && d < 2.0, "bond {}-{} has length {d}", bond.begin, bond.end);
        }
    }

    #[test]
    fn test_fragments_do_not_overlap() {
        let mol = parse_smiles("CCO.CCN").unwrap();
        let positions = compute_layout(&mol, None).unwrap();
        let max_first = (0..3).map(|a| positions[a][0]).fold(f64::MIN, f64::max);
        let min_second = (3..6).map(|a| positions[a][0]).fold(f64::MAX, f64::min);
        assert!(min_second > max_first);
    }

    #[test]
    fn test_expired_deadline() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(compute_layout(&mol, Some(Instant::now())), Err(LayoutTimeout));
    }
}
