//! Immutable declaration table built from a validated [`LoaderConfig`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::time::Duration;

use crate::config::locator::{BaseLocation, Location};
use crate::config::{ConfigError, LoaderConfig};

/// A registered resource: where it lives and what must load before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub locator: String,
    pub location: Location,
    pub prerequisites: Vec<String>,
    pub exports: Option<String>,
    pub integrity: Option<String>,
}

/// Registered declarations.
///
/// Construction validates the whole prerequisite graph, so a table that
/// exists is known to be acyclic with every prerequisite declared.
#[derive(Debug, Clone)]
pub struct DeclarationTable {
    base: BaseLocation,
    declarations: BTreeMap<String, Declaration>,
    integrity: BTreeMap<String, String>,
    wait: Option<Duration>,
}

impl DeclarationTable {
    /// Validate and register declarations.
    pub fn register(config: &LoaderConfig) -> Result<Self, ConfigError> {
        let base = BaseLocation::parse(&config.base_url)?;

        for (name, digest) in &config.integrity {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidIntegrity(name.clone()));
            }
        }

        let names: BTreeSet<&String> = config.paths.keys().chain(config.shim.keys()).collect();

        let mut declarations = BTreeMap::new();
        for name in names {
            let locator = config.paths.get(name).unwrap_or(name).clone();
            let location = base.resolve(name, &locator)?;
            let (prerequisites, exports) = config
                .shim
                .get(name)
                .map(|shim| (shim.deps.clone(), shim.exports.clone()))
                .unwrap_or_default();

            declarations.insert(
                name.clone(),
                Declaration {
                    name: name.clone(),
                    locator,
                    location,
                    prerequisites,
                    exports,
                    integrity: config.integrity.get(name).map(|d| d.to_lowercase()),
                },
            );
        }

        for declaration in declarations.values() {
            for prerequisite in &declaration.prerequisites {
                if !declarations.contains_key(prerequisite) {
                    return Err(ConfigError::MissingPrerequisite {
                        resource: declaration.name.clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
            }
        }

        let table = Self {
            base,
            declarations,
            integrity: config
                .integrity
                .iter()
                .map(|(k, v)| (k.clone(), v.to_lowercase()))
                .collect(),
            wait: config.wait_duration(),
        };
        table.check_acyclic()?;

        log::debug!("Registered {} declarations", table.declarations.len());
        Ok(table)
    }

    /// Look up a declared resource.
    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// Whether `name` was declared.
    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// All declared names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(|s| s.as_str())
    }

    /// The configured wait window.
    pub fn wait(&self) -> Option<Duration> {
        self.wait
    }

    /// Declaration for `name`, synthesizing a root resource when undeclared.
    ///
    /// A root resource uses its own name as locator and has no prerequisites.
    pub fn declaration(&self, name: &str) -> Result<Declaration, ConfigError> {
        if let Some(declaration) = self.declarations.get(name) {
            return Ok(declaration.clone());
        }

        Ok(Declaration {
            name: name.to_string(),
            locator: name.to_string(),
            location: self.base.resolve(name, name)?,
            prerequisites: Vec::new(),
            exports: None,
            integrity: self.integrity.get(name).cloned(),
        })
    }

    /// Direct prerequisites of `name` (empty for root resources).
    pub fn prerequisites(&self, name: &str) -> &[String] {
        self.declarations
            .get(name)
            .map(|d| d.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// Every resource needed by `names`, prerequisites before dependents.
    pub fn load_order(&self, names: &[String]) -> Vec<String> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for name in names {
            self.visit(name, &mut seen, &mut order);
        }
        order
    }

    fn visit(&self, name: &str, seen: &mut HashSet<String>, order: &mut Vec<String>) {
        if !seen.insert(name.to_string()) {
            return;
        }
        for prerequisite in self.prerequisites(name) {
            self.visit(prerequisite, seen, order);
        }
        order.push(name.to_string());
    }

    /// Kahn's algorithm over the prerequisite edges; leftovers mean a cycle.
    fn check_acyclic(&self) -> Result<(), ConfigError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, declaration) in &self.declarations {
            in_degree.insert(name.as_str(), declaration.prerequisites.len());
            for prerequisite in &declaration.prerequisites {
                dependents
                    .entry(prerequisite.as_str())
                    .or_default()
                    .push(name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut settled = 0;
        while let Some(name) = queue.pop_front() {
            settled += 1;
            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if settled != self.declarations.len() {
            return Err(ConfigError::Cycle {
                cycle: self.find_cycle(),
            });
        }
        Ok(())
    }

    fn find_cycle(&self) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for name in self.declarations.keys() {
            if let Some(cycle) = self.find_cycle_dfs(name, &mut visited, &mut stack) {
                return cycle;
            }
        }

        vec!["unknown cycle".to_string()]
    }

    fn find_cycle_dfs(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Some(cycle);
        }

        if !visited.insert(name.to_string()) {
            return None;
        }

        stack.push(name.to_string());
        for prerequisite in self.prerequisites(name) {
            if let Some(cycle) = self.find_cycle_dfs(prerequisite, visited, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        None
    }
}
