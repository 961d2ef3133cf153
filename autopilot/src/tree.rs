//! Arena over the generated project's file tree
//!
//! Nodes are stored flat and addressed by path. Construction walks the
//! server's nested tree with an explicit stack, so a deep tree can't
//! overflow the call stack, and rejects trees that break the path invariants.

use autopilot_sdk::{ApiError, ApiResult, FileTreeNode, NodeKind};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    /// Root is depth 0
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileTree {
    /// Pre-order; index 0 is the root
    entries: Vec<TreeEntry>,
    index: HashMap<String, usize>,
}

/// Whether `child` lies strictly below `parent`
fn is_within(parent: &str, child: &str) -> bool {
    let base = parent.trim_end_matches('/');
    if base.is_empty() {
        return child.len() > 1 || (child.len() == 1 && child != "/");
    }
    match child.strip_prefix(base) {
        Some(rest) => rest.starts_with('/') && rest.len() > 1,
        None => false,
    }
}

impl FileTree {
    pub fn build(root: &FileTreeNode, max_depth: usize) -> ApiResult<Self> {
        let mut entries: Vec<TreeEntry> = Vec::new();
        let mut index = HashMap::new();
        let mut stack: Vec<(&FileTreeNode, Option<usize>, usize)> = vec![(root, None, 0)];

        while let Some((node, parent, depth)) = stack.pop() {
            if depth > max_depth {
                return Err(ApiError::contract(format!(
                    "File tree exceeds maximum depth of {}",
                    max_depth
                )));
            }
            if index.contains_key(&node.path) {
                return Err(ApiError::contract(format!(
                    "Duplicate path in file tree: {}",
                    node.path
                )));
            }

            let children = node.children.as_deref().unwrap_or(&[]);
            if node.kind == NodeKind::File && !children.is_empty() {
                return Err(ApiError::contract(format!(
                    "File node has children: {}",
                    node.path
                )));
            }
            if let Some(parent_idx) = parent {
                let parent_path: &str = &entries[parent_idx].path;
                if !is_within(parent_path, &node.path) {
                    return Err(ApiError::contract(format!(
                        "Path {} is not inside its directory {}",
                        node.path, parent_path
                    )));
                }
            }

            let idx = entries.len();
            entries.push(TreeEntry {
                name: node.name.clone(),
                path: node.path.clone(),
                kind: node.kind,
                depth,
                parent,
                children: Vec::new(),
            });
            index.insert(node.path.clone(), idx);
            if let Some(parent_idx) = parent {
                entries[parent_idx].children.push(idx);
            }

            // Reverse so children pop in their listed order
            for child in children.iter().rev() {
                stack.push((child, Some(idx), depth + 1));
            }
        }

        Ok(Self { entries, index })
    }

    pub fn root(&self) -> &TreeEntry {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.index.get(path).map(|idx| &self.entries[*idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.get(path).map_or(false, |entry| !entry.is_dir())
    }

    pub fn children(&self, path: &str) -> Vec<&TreeEntry> {
        match self.get(path) {
            Some(entry) => entry.children.iter().map(|idx| &self.entries[*idx]).collect(),
            None => Vec::new(),
        }
    }

    /// All file paths, pre-order
    pub fn files(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| !entry.is_dir())
            .map(|entry| entry.path.as_str())
            .collect()
    }

    /// Rows to render: pre-order, descending only into expanded directories.
    ///
    /// The root is always shown and always descended into.
    pub fn visible_rows(&self, expanded: &HashSet<String>) -> Vec<&TreeEntry> {
        let mut rows = Vec::new();
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let entry = &self.entries[idx];
            rows.push(entry);
            if entry.is_dir() && (idx == 0 || expanded.contains(&entry.path)) {
                stack.extend(entry.children.iter().rev());
            }
        }
        rows
    }

    /// Every directory path, for "expand all"
    pub fn directories(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.path.clone())
            .collect()
    }

    /// Fuzzy match file paths against `query`, best score first
    pub fn search(&self, query: &str) -> Vec<&TreeEntry> {
        if query.is_empty() {
            return Vec::new();
        }
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &TreeEntry)> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_dir())
            .filter_map(|entry| {
                matcher
                    .fuzzy_match(&entry.path, query)
                    .map(|score| (score, entry))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}
