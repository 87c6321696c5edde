//! Plugin dependency ordering.
//!
//! Activation requires every declared dependency to be `ACTIVE` already.
//! Batch operations (restore on startup, deactivate-all on shutdown) use
//! [`activation_order`] so dependencies come up before their dependents and
//! go down after them.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use cmsdash_core::error::AppError;
use cmsdash_core::result::AppResult;
use cmsdash_core::types::PluginMetadata;

/// Orders `plugins` so that dependencies come before dependents.
///
/// Dependencies outside the given set are ignored. Ties are broken by id.
/// Plugins caught in a cycle cannot be ordered and are appended last, sorted
/// by id; activating them will fail the dependency check.
pub fn activation_order(plugins: &[PluginMetadata]) -> Vec<String> {
    let ids: BTreeSet<&str> = plugins.iter().map(|p| p.id.as_str()).collect();

    let mut in_degree: BTreeMap<&str, usize> = ids.iter().map(|id| (*id, 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for plugin in plugins {
        let deps: BTreeSet<&str> = plugin
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| ids.contains(dep) && *dep != plugin.id)
            .collect();
        for dep in deps {
            if let Some(degree) = in_degree.get_mut(plugin.id.as_str()) {
                *degree += 1;
            }
            dependents.entry(dep).or_default().push(plugin.id.as_str());
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(ids.len());

    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());

        let mut ready = Vec::new();
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(*dependent);
                }
            }
        }
        ready.sort_unstable();
        queue.extend(ready);
    }

    if order.len() < ids.len() {
        let placed: HashSet<String> = order.iter().cloned().collect();
        order.extend(
            ids.iter()
                .filter(|id| !placed.contains(**id))
                .map(|id| id.to_string()),
        );
    }

    order
}

/// Fails naming the first declared dependency of `metadata` that is not active.
pub fn check_dependencies(metadata: &PluginMetadata, active: &HashSet<String>) -> AppResult<()> {
    match metadata.dependencies.iter().find(|dep| !active.contains(*dep)) {
        Some(dep) => Err(AppError::dependency(format!(
            "Plugin '{}' depends on '{}' which is not active",
            metadata.id, dep
        ))),
        None => Ok(()),
    }
}

/// Returns the ids of `loaded` plugins that declare a dependency on `plugin_id`, sorted.
pub fn dependents_of<'a, I>(plugin_id: &str, loaded: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a PluginMetadata>,
{
    let mut dependents: Vec<String> = loaded
        .into_iter()
        .filter(|m| m.id != plugin_id && m.depends_on(plugin_id))
        .map(|m| m.id.clone())
        .collect();
    dependents.sort();
    dependents
}
