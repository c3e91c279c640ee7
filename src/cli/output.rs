//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::TenantGroup;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print labelled field (dimmed label)
pub fn field(label: &str, value: &(impl std::fmt::Display + ?Sized)) {
    println!("  {:<14} {}", format!("{label}:").dimmed(), value);
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data/export statements)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    print!("{}", msg);
}

/// Build display trees from groups listed in pre-order.
pub fn group_forest(groups: &[TenantGroup]) -> Vec<Tree<String>> {
    let mut roots = Vec::new();
    let mut open: Vec<Tree<String>> = Vec::new();
    for group in groups {
        while open.len() > group.depth() as usize {
            close_one(&mut open, &mut roots);
        }
        open.push(Tree::new(format!("{} ({})", group.name, group.slug)));
    }
    while !open.is_empty() {
        close_one(&mut open, &mut roots);
    }
    roots
}

fn close_one(open: &mut Vec<Tree<String>>, roots: &mut Vec<Tree<String>>) {
    if let Some(done) = open.pop() {
        match open.last_mut() {
            Some(parent) => {
                parent.push(done);
            }
            None => roots.push(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GroupTree, NewTenantGroup};

    #[test]
    fn given_nested_groups_when_group_forest_then_mirrors_hierarchy() {
        let mut tree = GroupTree::new();
        let americas = tree
            .insert(NewTenantGroup::new("Americas", "americas"))
            .expect("insert");
        tree.insert(NewTenantGroup::new("Mexico", "mexico").with_parent(americas))
            .expect("insert");
        tree.insert(NewTenantGroup::new("Canada", "canada").with_parent(americas))
            .expect("insert");
        tree.insert(NewTenantGroup::new("Europe", "europe"))
            .expect("insert");
        let groups: Vec<TenantGroup> = tree.iter().cloned().collect();

        let forest = group_forest(&groups);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].root, "Americas (americas)");
        let children: Vec<&str> = forest[0].leaves.iter().map(|t| t.root.as_str()).collect();
        assert_eq!(children, vec!["Canada (canada)", "Mexico (mexico)"]);
        assert!(forest[1].leaves.is_empty());
    }
}
