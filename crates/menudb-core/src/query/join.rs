//! Join planning.
//!
//! Given the join paths required by every resolved column of one filter
//! specification, produce the minimal, dependency-ordered join list.

use std::collections::HashSet;

use crate::catalog::JoinDef;
use crate::error::Error;

/// Computes the ordered set of joins for one query.
pub struct JoinManager<'a> {
    entity: &'a str,
    root_alias: &'a str,
}

impl<'a> JoinManager<'a> {
    /// Create a join manager for the entity whose base table alias is `root_alias`.
    pub fn new(entity: &'a str, root_alias: &'a str) -> Self {
        Self { entity, root_alias }
    }

    /// Union, deduplicate and order `paths`.
    ///
    /// Joins sharing an alias are emitted once. A join always follows the
    /// join introducing its `left_alias`; otherwise first-seen order wins.
    pub fn plan<'p, I>(&self, paths: I) -> Result<Vec<JoinDef>, Error>
    where
        I: IntoIterator<Item = &'p [JoinDef]>,
    {
        let mut unique: Vec<&JoinDef> = Vec::new();
        for path in paths {
            for join in path {
                match unique.iter().find(|j| j.alias == join.alias) {
                    Some(existing) if *existing != join => {
                        return Err(Error::InvalidMapping(format!(
                            "alias '{}' in {} bound to two different joins",
                            join.alias, self.entity
                        )));
                    }
                    Some(_) => {}
                    None => unique.push(join),
                }
            }
        }

        let known: HashSet<&str> = unique.iter().map(|j| j.alias.as_str()).collect();
        for join in &unique {
            let dep = join.depends_on();
            if dep != self.root_alias && !known.contains(dep) {
                return Err(Error::InvalidMapping(format!(
                    "join '{}' in {} depends on '{}' which is not part of the plan",
                    join.alias, self.entity, dep
                )));
            }
        }

        let mut placed: HashSet<&str> = HashSet::new();
        let mut ordered: Vec<JoinDef> = Vec::with_capacity(unique.len());
        let mut remaining = unique;

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|j| {
                let dep = j.depends_on();
                dep == self.root_alias || placed.contains(dep)
            });
            match ready {
                Some(idx) => {
                    let join = remaining.remove(idx);
                    placed.insert(join.alias.as_str());
                    ordered.push(join.clone());
                }
                None => {
                    return Err(Error::JoinCycleDetected {
                        entity: self.entity.to_string(),
                        aliases: remaining.iter().map(|j| j.alias.clone()).collect(),
                    });
                }
            }
        }

        Ok(ordered)
    }
}
