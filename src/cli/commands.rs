//! Command dispatch
//!
//! Records are addressed by slug on the command line; handlers resolve them
//! to ids through the services and print results with the output helpers.

use std::collections::BTreeSet;
use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{
    Cli, Commands, ConfigCommands, ExportKind, GroupCommands, SupervisorCommands, TenantCommands,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{
    slugify, ExternalKey, GroupChanges, GroupId, NewSupervisor, NewTenant, NewTenantGroup,
    Supervisor, SupervisorChanges, Tenant, TenantChanges, TenantId,
};
use crate::infrastructure::di::ServiceContainer;

/// Run the parsed command line against the configured store.
pub fn execute_command(cli: &Cli, settings: Settings) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => run_config(command, &settings, cli),
        other => {
            let container = ServiceContainer::new(settings)?;
            dispatch(other, &container)
        }
    }
}

/// Run a store-backed command.
pub fn dispatch(command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        Commands::Group { command } => run_group(command, container),
        Commands::Tenant { command } => run_tenant(command, container),
        Commands::Supervisor { command } => run_supervisor(command, container),
        Commands::Export { kind } => run_export(*kind, container),
        Commands::Audit { limit } => run_audit(*limit, container),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not use the data store".to_string(),
        )),
    }
}

// ============================================================
// GROUPS
// ============================================================

#[instrument(level = "debug", skip(container))]
fn run_group(command: &GroupCommands, container: &ServiceContainer) -> CliResult<()> {
    let groups = &container.groups;
    match command {
        GroupCommands::Add {
            name,
            slug,
            parent,
            description,
        } => {
            let slug = slug.clone().unwrap_or_else(|| slugify(name));
            let mut new = NewTenantGroup::new(name, slug).with_description(description);
            if let Some(parent) = parent {
                new = new.with_parent(groups.get_by_slug(parent)?.id);
            }
            let group = groups.create(new)?;
            output::action("Created", &format!("tenant group {} ({})", group.name, group.slug));
        }
        GroupCommands::Edit {
            slug,
            name,
            new_slug,
            description,
        } => {
            let id = groups.get_by_slug(slug)?.id;
            let changes = GroupChanges {
                name: name.clone(),
                slug: new_slug.clone(),
                description: description.clone(),
            };
            if changes.is_empty() {
                return Err(CliError::InvalidArgs("nothing to change".to_string()));
            }
            let group = groups.update(id, changes)?;
            output::action("Updated", &format!("tenant group {} ({})", group.name, group.slug));
        }
        GroupCommands::Move { slug, parent, root } => {
            let id = groups.get_by_slug(slug)?.id;
            let new_parent = if *root {
                None
            } else if let Some(p) = parent {
                Some(groups.get_by_slug(p)?.id)
            } else {
                return Err(CliError::InvalidArgs(
                    "either --parent or --root is required".to_string(),
                ));
            };
            let group = groups.move_to(id, new_parent)?;
            let path = group_path(container, group.id)?;
            output::action("Moved", &path);
        }
        GroupCommands::Delete { slug, cascade } => {
            let id = groups.get_by_slug(slug)?.id;
            let cascade = *cascade || container.settings.cascade_delete;
            debug!("delete {} cascade={}", slug, cascade);
            let removed = groups.delete(id, cascade)?;
            for group in &removed {
                output::action("Deleted", &format!("tenant group {} ({})", group.name, group.slug));
            }
        }
        GroupCommands::List { counts } => {
            if *counts {
                for entry in groups.tenant_counts() {
                    output::info(&format!(
                        "{}{} ({}) [{}]\n",
                        "  ".repeat(entry.group.depth() as usize),
                        entry.group.name,
                        entry.group.slug,
                        entry.tenants
                    ));
                }
            } else {
                for group in groups.list() {
                    output::info(&format!(
                        "{}{} ({})\n",
                        "  ".repeat(group.depth() as usize),
                        group.name,
                        group.slug
                    ));
                }
            }
        }
        GroupCommands::Tree => {
            let all = groups.list();
            if all.is_empty() {
                output::warning("no tenant groups");
            }
            for tree in output::group_forest(&all) {
                output::info(&tree);
            }
        }
        GroupCommands::Show { slug } => {
            let group = groups.get_by_slug(slug)?;
            output::header(&group.name);
            output::field("slug", &group.slug);
            output::field("path", &group_path(container, group.id)?);
            output::field("description", &group.description);
            output::field("url", &group.absolute_url());
            output::field(
                "bounds",
                &format!(
                    "tree {} [{}, {}] depth {}",
                    group.tree_id(),
                    group.left_bound(),
                    group.right_bound(),
                    group.depth()
                ),
            );
            if !group.is_leaf() {
                let children = groups.children(group.id)?;
                output::header("Children");
                for child in children {
                    output::detail(&format!("{} ({})", child.name, child.slug));
                }
            }
            let tenants = container.tenants.list_in_group(group.id, true)?;
            if !tenants.is_empty() {
                output::header("Tenants (including subgroups)");
                for tenant in tenants {
                    output::detail(&format!("{} ({})", tenant.name, tenant.slug));
                }
            }
        }
        GroupCommands::Rebuild => {
            let count = groups.rebuild()?;
            output::success(&format!("rebuilt {count} tenant group(s)"));
        }
        GroupCommands::Check => match groups.check() {
            Ok(()) => output::success("tenant group trees are consistent"),
            Err(e) => {
                output::failure(&e);
                output::detail(&"run `tenancy group rebuild` to repair");
                return Err(e.into());
            }
        },
    }
    Ok(())
}

/// "Americas / Canada" style path of a group.
fn group_path(container: &ServiceContainer, id: GroupId) -> CliResult<String> {
    let mut names: Vec<String> = container
        .groups
        .ancestors(id)?
        .into_iter()
        .map(|g| g.name)
        .collect();
    names.push(container.groups.get(id)?.name);
    Ok(names.join(" / "))
}

// ============================================================
// TENANTS
// ============================================================

#[instrument(level = "debug", skip(container))]
fn run_tenant(command: &TenantCommands, container: &ServiceContainer) -> CliResult<()> {
    let tenants = &container.tenants;
    match command {
        TenantCommands::Add {
            name,
            slug,
            group,
            description,
            comments,
            tags,
        } => {
            let slug = slug.clone().unwrap_or_else(|| slugify(name));
            let mut new = NewTenant::new(name, slug);
            if let Some(group) = group {
                new = new.in_group(container.groups.get_by_slug(group)?.id);
            }
            new.description = description.clone();
            new.comments = comments.clone();
            new.tags = tags.iter().cloned().collect();
            let tenant = tenants.create(new)?;
            output::action("Created", &format!("tenant {} ({})", tenant.name, tenant.slug));
        }
        TenantCommands::Clone { source, name, slug } => {
            let source = tenants.get_by_slug(source)?;
            let slug = slug.clone().unwrap_or_else(|| slugify(name));
            let tenant = tenants.clone_from(source.id, name, slug)?;
            output::action("Created", &format!("tenant {} ({})", tenant.name, tenant.slug));
        }
        TenantCommands::Edit {
            slug,
            name,
            new_slug,
            group,
            no_group,
            description,
            comments,
            tags,
        } => {
            let id = tenants.get_by_slug(slug)?.id;
            let group = if *no_group {
                Some(None)
            } else if let Some(g) = group {
                Some(Some(container.groups.get_by_slug(g)?.id))
            } else {
                None
            };
            let changes = TenantChanges {
                name: name.clone(),
                slug: new_slug.clone(),
                group,
                description: description.clone(),
                comments: comments.clone(),
                tags: tags.as_ref().map(|t| t.iter().cloned().collect::<BTreeSet<_>>()),
                custom_fields: None,
            };
            let tenant = tenants.update(id, changes)?;
            output::action("Updated", &format!("tenant {} ({})", tenant.name, tenant.slug));
        }
        TenantCommands::Delete { slug } => {
            let id = tenants.get_by_slug(slug)?.id;
            let tenant = tenants.delete(id)?;
            output::action("Deleted", &format!("tenant {} ({})", tenant.name, tenant.slug));
        }
        TenantCommands::List { group, recursive } => {
            let list = match group {
                Some(g) => {
                    let id = container.groups.get_by_slug(g)?.id;
                    tenants.list_in_group(id, *recursive)?
                }
                None => tenants.list(),
            };
            for tenant in list {
                output::info(&format!("{}\n", tenant_line(container, &tenant)));
            }
        }
        TenantCommands::Show { slug } => {
            let tenant = tenants.get_by_slug(slug)?;
            output::header(&tenant.name);
            output::field("slug", &tenant.slug);
            output::field("group", &group_label(container, &tenant));
            output::field("description", &tenant.description);
            output::field("comments", &tenant.comments);
            output::field(
                "tags",
                &tenant.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            );
            output::field("url", &tenant.absolute_url());
            let supervisors = container.supervisors.list_for_tenant(tenant.id)?;
            if !supervisors.is_empty() {
                output::header("Supervisors");
                for supervisor in supervisors {
                    output::detail(&format!("{} ({})", supervisor.full_name, supervisor.sid));
                }
            }
        }
    }
    Ok(())
}

fn group_label(container: &ServiceContainer, tenant: &Tenant) -> String {
    tenant
        .group
        .and_then(|g| container.groups.get(g).ok())
        .map(|g| g.name)
        .unwrap_or_else(|| "-".to_string())
}

fn tenant_line(container: &ServiceContainer, tenant: &Tenant) -> String {
    format!(
        "{:<30} {:<30} {}",
        tenant.name,
        tenant.slug,
        group_label(container, tenant)
    )
}

// ============================================================
// SUPERVISORS
// ============================================================

#[instrument(level = "debug", skip(container))]
fn run_supervisor(command: &SupervisorCommands, container: &ServiceContainer) -> CliResult<()> {
    let supervisors = &container.supervisors;
    match command {
        SupervisorCommands::Add {
            full_name,
            sid,
            slug,
            email,
            phone,
            comments,
            inactive,
            tenants,
        } => {
            let slug = slug.clone().unwrap_or_else(|| slugify(full_name));
            let mut new = NewSupervisor::new(full_name, sid, slug);
            new.email = email.clone();
            new.phone_number = phone.clone();
            new.comments = comments.clone();
            new.is_active = !inactive;
            new.tenants = resolve_tenants(container, tenants)?.into_iter().collect();
            let supervisor = supervisors.create(new)?;
            output::action(
                "Created",
                &format!("supervisor {} ({})", supervisor.full_name, supervisor.slug),
            );
        }
        SupervisorCommands::Edit {
            slug,
            full_name,
            sid,
            new_slug,
            email,
            phone,
            comments,
            active,
        } => {
            let id = supervisors.get_by_slug(slug)?.id;
            let changes = SupervisorChanges {
                full_name: full_name.clone(),
                email: email.clone(),
                phone_number: phone.clone(),
                sid: sid.clone(),
                slug: new_slug.clone(),
                comments: comments.clone(),
                is_active: *active,
            };
            let supervisor = supervisors.update(id, changes)?;
            output::action(
                "Updated",
                &format!("supervisor {} ({})", supervisor.full_name, supervisor.slug),
            );
        }
        SupervisorCommands::Assign { slug, tenants } => {
            let id = supervisors.get_by_slug(slug)?.id;
            let ids = resolve_tenants(container, tenants)?;
            let supervisor = supervisors.assign(id, &ids)?;
            output::action("Assigned", &supervisor_tenants(container, &supervisor));
        }
        SupervisorCommands::Unassign { slug, tenants } => {
            let id = supervisors.get_by_slug(slug)?.id;
            let ids = resolve_tenants(container, tenants)?;
            let supervisor = supervisors.unassign(id, &ids)?;
            output::action("Unassigned", &supervisor_tenants(container, &supervisor));
        }
        SupervisorCommands::Delete { slug } => {
            let id = supervisors.get_by_slug(slug)?.id;
            let supervisor = supervisors.delete(id)?;
            output::action(
                "Deleted",
                &format!("supervisor {} ({})", supervisor.full_name, supervisor.slug),
            );
        }
        SupervisorCommands::List { tenant } => {
            let list = match tenant {
                Some(t) => {
                    let id = container.tenants.get_by_slug(t)?.id;
                    supervisors.list_for_tenant(id)?
                }
                None => supervisors.list(),
            };
            for s in list {
                let state = if s.is_active { "" } else { " (inactive)" };
                output::info(&format!("{:<30} {:<8} {}{}\n", s.full_name, s.sid, s.email, state));
            }
        }
        SupervisorCommands::Show { slug } => {
            let s = supervisors.get_by_slug(slug)?;
            output::header(&s.full_name);
            output::field("slug", &s.slug);
            output::field("sid", &s.sid);
            output::field("email", &s.email);
            output::field("phone", &s.phone_number);
            output::field("active", &s.is_active);
            output::field("comments", &s.comments);
            output::field("url", &s.absolute_url());
            output::field("tenants", &supervisor_tenants(container, &s));
        }
    }
    Ok(())
}

fn resolve_tenants(container: &ServiceContainer, slugs: &[String]) -> CliResult<Vec<TenantId>> {
    slugs
        .iter()
        .map(|slug| -> CliResult<TenantId> { Ok(container.tenants.get_by_slug(slug)?.id) })
        .collect()
}

fn supervisor_tenants(container: &ServiceContainer, supervisor: &Supervisor) -> String {
    let mut names: Vec<String> = supervisor
        .tenants
        .iter()
        .filter_map(|t| container.tenants.get(*t).ok())
        .map(|t| t.name)
        .collect();
    names.sort();
    format!("{}: {}", supervisor.full_name, names.join(", "))
}

// ============================================================
// EXPORT / AUDIT / CONFIG
// ============================================================

fn run_export(kind: ExportKind, container: &ServiceContainer) -> CliResult<()> {
    let document = match kind {
        ExportKind::Groups => container.groups.export_csv(),
        ExportKind::Tenants => container.tenants.export_csv(),
        ExportKind::Supervisors => container.supervisors.export_csv(),
    };
    output::info(&document);
    Ok(())
}

fn run_audit(limit: Option<usize>, container: &ServiceContainer) -> CliResult<()> {
    let entries = container.store.audit_entries()?;
    let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
    for change in entries.iter().skip(skip) {
        output::info(&format!(
            "{} {:<7} {:<20} {}\n",
            change.time.format("%Y-%m-%d %H:%M:%S"),
            change.action.to_string(),
            change.kind.to_string(),
            change.object_repr
        ));
    }
    Ok(())
}

fn run_config(command: &ConfigCommands, settings: &Settings, cli: &Cli) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let toml = settings.to_toml()?;
            output::info(&toml);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::field("global", &p.display()),
                None => output::field("global", &"-"),
            }
            let dir = match &cli.dir {
                Some(d) => d.clone(),
                None => std::env::current_dir().map_err(|e| {
                    CliError::Infra(crate::infrastructure::InfraError::io("current directory", e))
                })?,
            };
            output::field("local", &local_config_path(&dir).display());
            output::field("data", &settings.data_file.display());
            output::field("audit", &settings.audit_log.display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
