//! Conflict ranking, the master/dependent hierarchy and orientation
//! bundles.
//!
//! Two stems conflict when they are parallel and their edge bands
//! overlap: only one of them can be positioned freely at rendering
//! time. Each group of mutually conflicting stems elects a master; the
//! rest defer to it, and narrow stub-like dependents sharing an edge
//! with their master are recorded as serif attachments instead. Stems
//! are finally partitioned into orientation bundles, sorted along the
//! cross axis and given their stable indices.

use kurbo::Vec2;
use outline_geom::approx;

use crate::analyzer::Analyzer;
use crate::stem::{DependentStem, SerifRef, StemBundle};

/// True when only one of the two stems can hold its position.
pub(crate) fn stems_conflict(az: &Analyzer, a: usize, b: usize) -> bool {
    let sa = &az.stems[a];
    let sb = &az.stems[b];
    if !approx::parallel_within(sa.unit, sb.unit, az.tol.slope_error) {
        return false;
    }
    // Edge bands along the shared normal.
    let (a0, a1) = normal_band(az, a);
    let (b0, b1) = normal_band(az, b);
    if a1 < b0 || b1 < a0 {
        return false;
    }
    // And their evidence overlaps along the axis.
    let offset = (sb.left - sa.left).dot(sa.unit);
    sa.active.iter().any(|ra| {
        sb.active
            .iter()
            .any(|rb| ra.start < rb.end + offset && rb.start + offset < ra.end)
    })
}

fn normal_band(az: &Analyzer, si: usize) -> (f64, f64) {
    let stem = &az.stems[si];
    let l = stem.left.to_vec2().dot(stem.l_to_r);
    let r = stem.right.to_vec2().dot(stem.l_to_r);
    let fudge = az.stem_dist_error(stem.unit);
    (l.min(r) - fudge, l.max(r) + fudge)
}

/// Ranks each set of mutually conflicting stems and wires up the
/// master/dependent links.
///
/// The ranking prefers positioned stems, then blue-zone ghosts, then
/// longer active evidence, then the narrower stem: preserved empirical
/// tie-breaking.
pub(crate) fn look_for_masters(az: &mut Analyzer) {
    let count = az.stems.len();
    let mut component = vec![usize::MAX; count];
    let mut next_component = 0;
    for a in 0..count {
        for b in a + 1..count {
            if !stems_conflict(az, a, b) {
                continue;
            }
            match (component[a], component[b]) {
                (usize::MAX, usize::MAX) => {
                    component[a] = next_component;
                    component[b] = next_component;
                    next_component += 1;
                }
                (ca, usize::MAX) => component[b] = ca,
                (usize::MAX, cb) => component[a] = cb,
                (ca, cb) if ca != cb => {
                    for slot in component.iter_mut() {
                        if *slot == cb {
                            *slot = ca;
                        }
                    }
                }
                _ => {}
            }
        }
    }
    for group in 0..next_component {
        let members: Vec<usize> = (0..count).filter(|&ix| component[ix] == group).collect();
        if members.len() < 2 {
            continue;
        }
        let master = members
            .iter()
            .copied()
            .max_by(|&x, &y| rank(az, x).partial_cmp(&rank(az, y)).unwrap_or(core::cmp::Ordering::Equal))
            .unwrap();
        for &si in &members {
            if si == master {
                continue;
            }
            if is_serif_of(az, si, master) {
                let l_base = shares_left_edge(az, si, master);
                let is_ball = az.stems[si].chunks.iter().any(|c| c.is_ball);
                az.stems[master].serifs.push(SerifRef {
                    stem: si,
                    is_ball,
                    l_base,
                });
            }
            az.stems[si].master = Some(master);
            let l_base = shares_left_edge(az, si, master);
            az.stems[master]
                .dependents
                .push(DependentStem { stem: si, l_base });
        }
    }
}

/// Ranking key; higher wins the master election.
fn rank(az: &Analyzer, si: usize) -> (i32, i32, i32, f64, f64) {
    let stem = &az.stems[si];
    (
        stem.positioned as i32,
        stem.blue.is_some() as i32,
        !stem.too_wide as i32,
        stem.clen,
        // Prefer the narrower stem unless conflicting evidence above.
        -stem.width(),
    )
}

/// A dependent narrow enough, stubby enough and edge-sharing enough to
/// count as a serif or ball attachment.
fn is_serif_of(az: &Analyzer, si: usize, master: usize) -> bool {
    let stem = &az.stems[si];
    let main = &az.stems[master];
    if stem.ghost || stem.bbox || main.ghost {
        return false;
    }
    let stubby = !stem.chunks.is_empty() && stem.chunks.iter().all(|c| c.stub || c.is_ball);
    stubby && stem.width() * 3.0 < main.width().max(1.0) * 2.0 && shares_any_edge(az, si, master)
}

fn shares_any_edge(az: &Analyzer, si: usize, master: usize) -> bool {
    let stem = &az.stems[si];
    let main = &az.stems[master];
    let fudge = az.stem_dist_error(main.unit);
    [stem.left, stem.right]
        .into_iter()
        .any(|p| main.on_left_edge(p, fudge) || main.on_right_edge(p, fudge))
}

fn shares_left_edge(az: &Analyzer, si: usize, master: usize) -> bool {
    let stem = &az.stems[si];
    let main = &az.stems[master];
    let fudge = az.stem_dist_error(main.unit);
    main.on_left_edge(stem.left, fudge) || main.on_left_edge(stem.right, fudge)
}

/// Partitions stems into orientation bundles, sorts each along its
/// cross axis and assigns the stable indices used as mask bit
/// positions.
///
/// Horizontal stems index first, then vertical, then italic/diagonal:
/// the order hint dictionaries expect.
pub(crate) fn bundle_stems(az: &mut Analyzer) {
    let slope = az.tol.slope_error;
    let mut horizontal: Vec<usize> = Vec::new();
    let mut vertical: Vec<usize> = Vec::new();
    let mut italic: Vec<usize> = Vec::new();
    for (si, stem) in az.stems.iter().enumerate() {
        if stem.is_horizontal(slope) {
            horizontal.push(si);
        } else if stem.is_vertical(slope) {
            vertical.push(si);
        } else {
            italic.push(si);
        }
    }
    let cross_pos = |az: &Analyzer, si: usize| {
        let stem = &az.stems[si];
        stem.left.to_vec2().dot(stem.l_to_r)
    };
    for list in [&mut horizontal, &mut vertical, &mut italic] {
        list.sort_by(|&x, &y| {
            cross_pos(az, x)
                .partial_cmp(&cross_pos(az, y))
                .unwrap_or(core::cmp::Ordering::Equal)
        });
    }
    let mut next_idx = 0;
    for list in [&horizontal, &vertical, &italic] {
        for &si in list.iter() {
            az.stems[si].stem_idx = Some(next_idx);
            next_idx += 1;
        }
    }
    az.bundles[0] = StemBundle {
        unit: Vec2::new(-1.0, 0.0),
        stems: horizontal,
    };
    az.bundles[1] = StemBundle {
        unit: Vec2::new(0.0, 1.0),
        stems: vertical,
    };
    let italic_unit = az
        .stems
        .iter()
        .find(|s| s.italic)
        .map(|s| s.unit)
        .unwrap_or(Vec2::new(0.0, 1.0));
    az.bundles[2] = StemBundle {
        unit: italic_unit,
        stems: italic,
    };
}
