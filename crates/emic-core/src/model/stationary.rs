//! Graph structure and the stationary distribution of the state chain.

use super::ModelError;

/// Strongly connected components of a directed graph given as adjacency
/// lists. Components are listed in discovery order; each is sorted.
///
/// Iterative Kosaraju, so deep chains do not exhaust the stack.
pub fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();

    // First pass: record vertices by finishing time.
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut stack = vec![(root, 0usize)];
        while let Some((v, next)) = stack.last_mut() {
            let v = *v;
            if let Some(&w) = adjacency[v].get(*next) {
                *next += 1;
                if !visited[w] {
                    visited[w] = true;
                    stack.push((w, 0));
                }
            } else {
                order.push(v);
                stack.pop();
            }
        }
    }

    // Second pass over the transposed graph in reverse finishing order.
    let mut reverse = vec![Vec::new(); n];
    for (v, targets) in adjacency.iter().enumerate() {
        for &w in targets {
            reverse[w].push(v);
        }
    }
    let mut component_of = vec![usize::MAX; n];
    let mut components = Vec::new();
    for &root in order.iter().rev() {
        if component_of[root] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = vec![root];
        component_of[root] = id;
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            for &w in &reverse[v] {
                if component_of[w] == usize::MAX {
                    component_of[w] = id;
                    members.push(w);
                    stack.push(w);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Components with no edge leaving them (the recurrent classes).
pub fn closed_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let components = strongly_connected_components(adjacency);
    let mut component_of = vec![0; adjacency.len()];
    for (id, members) in components.iter().enumerate() {
        for &v in members {
            component_of[v] = id;
        }
    }
    components
        .iter()
        .enumerate()
        .filter(|(id, members)| {
            members
                .iter()
                .all(|&v| adjacency[v].iter().all(|&w| component_of[w] == *id))
        })
        .map(|(_, members)| members.clone())
        .collect()
}

/// Solve π (T - I) = 0 with Σπ = 1 for an irreducible row-stochastic `matrix`.
pub(crate) fn solve_stationary(matrix: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
    let n = matrix.len();
    if n == 0 {
        return Err(ModelError::NoStationaryDistribution {
            reason: "model has no states".to_string(),
        });
    }

    // Rows of the transposed system; the last balance equation is redundant
    // and is replaced by normalization.
    let mut a = vec![vec![0.0; n]; n];
    for (i, row) in a.iter_mut().enumerate().take(n - 1) {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = matrix[j][i] - if i == j { 1.0 } else { 0.0 };
        }
    }
    a[n - 1] = vec![1.0; n];
    let mut b = vec![0.0; n];
    b[n - 1] = 1.0;

    let mut pi = emic_math::solve_linear_system(a, b).ok_or_else(|| {
        ModelError::NoStationaryDistribution {
            reason: "balance equations are singular".to_string(),
        }
    })?;

    for p in pi.iter_mut() {
        if *p < 0.0 {
            if *p < -1e-9 {
                return Err(ModelError::NoStationaryDistribution {
                    reason: format!("solution has negative mass {}", p),
                });
            }
            *p = 0.0;
        }
    }
    let total: f64 = pi.iter().sum();
    if !total.is_finite() || (total - 1.0).abs() > 1e-6 {
        return Err(ModelError::NoStationaryDistribution {
            reason: format!("solution mass {} is not normalized", total),
        });
    }
    for p in pi.iter_mut() {
        *p /= total;
    }
    Ok(pi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scc_of_cycle_with_tail() {
        // 0 -> 1 -> 2 -> 1, 3 isolated
        let adj = vec![vec![1], vec![2], vec![1], vec![]];
        let mut comps = strongly_connected_components(&adj);
        comps.sort();
        assert_eq!(comps, vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn closed_components_skip_transients() {
        let adj = vec![vec![1, 3], vec![2], vec![1], vec![3]];
        let mut closed = closed_components(&adj);
        closed.sort();
        assert_eq!(closed, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let n = 100_000;
        let adj: Vec<Vec<usize>> = (0..n).map(|i| vec![(i + 1) % n]).collect();
        assert_eq!(strongly_connected_components(&adj).len(), 1);
    }

    #[test]
    fn stationary_of_two_state_chain() {
        let t = vec![vec![0.9, 0.1], vec![0.5, 0.5]];
        let pi = solve_stationary(&t).unwrap();
        // π0 = 0.5 / (0.1 + 0.5)
        assert!((pi[0] - 5.0 / 6.0).abs() < 1e-12);
        assert!((pi.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
