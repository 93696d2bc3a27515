//! Dependency levelling.
//!
//! Kahn's algorithm over the planned maps: level 0 depends on nothing
//! planned, level n+1 only on earlier levels. Plans within one level
//! are independent and may run in parallel; levels run in order.

use indexmap::IndexMap;
use thiserror::Error;

use chronal_compiler::OutputMapPlan;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle through planned map <{0}>")]
pub struct CycleError(pub String);

/// Group plans into dependency levels, preserving plan order within a
/// level so scheduling stays deterministic.
pub fn dependency_levels<'a>(
    plans: &[&'a OutputMapPlan],
) -> Result<Vec<Vec<&'a OutputMapPlan>>, CycleError> {
    let index: IndexMap<&str, usize> = plans
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    let mut indegree = vec![0usize; plans.len()];
    let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); plans.len()];
    for (i, plan) in plans.iter().enumerate() {
        for dep in &plan.deps {
            // Deps on maps outside the plan list are already satisfied.
            if let Some(&producer) = index.get(dep.as_str()) {
                indegree[i] += 1;
                consumers[producer].push(i);
            }
        }
    }

    let mut levels = Vec::new();
    let mut placed = vec![false; plans.len()];
    let mut done = 0usize;
    while done < plans.len() {
        let ready: Vec<usize> = (0..plans.len())
            .filter(|&i| !placed[i] && indegree[i] == 0)
            .collect();
        if ready.is_empty() {
            let stuck = plans
                .iter()
                .enumerate()
                .find(|(i, _)| !placed[*i])
                .map(|(_, p)| p.name.clone())
                .unwrap_or_default();
            return Err(CycleError(stuck));
        }
        for &i in &ready {
            placed[i] = true;
            for &consumer in &consumers[i] {
                indegree[consumer] -= 1;
            }
        }
        done += ready.len();
        levels.push(ready.into_iter().map(|i| plans[i]).collect());
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronal_core::{TemporalExtent, TimeStamp};

    fn plan(name: &str, deps: &[&str]) -> OutputMapPlan {
        OutputMapPlan {
            name: name.to_string(),
            expression: String::new(),
            extent: TemporalExtent::instant(TimeStamp::Relative(0)),
            inputs: Vec::new(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            is_intermediate: false,
        }
    }

    fn names(level: &[&OutputMapPlan]) -> Vec<String> {
        level.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn independent_plans_share_one_level() {
        let plans = [plan("a", &[]), plan("b", &[]), plan("c", &[])];
        let refs: Vec<_> = plans.iter().collect();
        let levels = dependency_levels(&refs).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(names(&levels[0]), ["a", "b", "c"]);
    }

    #[test]
    fn consumers_land_after_their_producers() {
        let plans = [
            plan("out", &["t0", "t1"]),
            plan("t0", &[]),
            plan("t1", &["t0"]),
        ];
        let refs: Vec<_> = plans.iter().collect();
        let levels = dependency_levels(&refs).unwrap();
        assert_eq!(names(&levels[0]), ["t0"]);
        assert_eq!(names(&levels[1]), ["t1"]);
        assert_eq!(names(&levels[2]), ["out"]);
    }

    #[test]
    fn external_deps_are_ignored() {
        let plans = [plan("a", &["not_planned"])];
        let refs: Vec<_> = plans.iter().collect();
        let levels = dependency_levels(&refs).unwrap();
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn cycles_are_reported() {
        let plans = [plan("a", &["b"]), plan("b", &["a"])];
        let refs: Vec<_> = plans.iter().collect();
        let err = dependency_levels(&refs).unwrap_err();
        assert_eq!(err, CycleError("a".to_string()));
    }
}
