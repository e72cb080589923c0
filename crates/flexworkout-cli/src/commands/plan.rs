use std::path::{Path, PathBuf};

use clap::Subcommand;
use flexworkout_core::{
    build_sequence, default_plan, ActivePlanRecord, Database, DatabaseError, Plan, PlanStore,
    RoundsConfig,
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print the active plan (the built-in plan if none is set)
    Show {
        /// Print the flattened step sequence instead of the sections
        #[arg(long)]
        steps: bool,
    },
    /// List saved plans, newest first
    List,
    /// Save the active plan (or a plan file) under a title
    Save {
        /// Title; blank gives a dated default
        #[arg(long, default_value = "")]
        title: String,
        /// Plan JSON file to save instead of the active plan
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a saved plan
    Delete {
        /// Saved plan ID
        id: String,
    },
    /// Make a saved plan the active plan
    Use {
        /// Saved plan ID
        id: String,
    },
    /// Validate a plan JSON file and make it the active plan
    Import {
        path: PathBuf,
        /// Also save it under this title
        #[arg(long)]
        title: Option<String>,
    },
    /// Forget the active plan and fall back to the built-in one
    Clear,
}

pub fn read_plan_file(path: &Path) -> Result<Plan> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    Ok(Plan::from_json(&json)?)
}

/// The active plan record, or the built-in plan when none is stored.
pub fn active_or_default(db: &Database) -> Result<ActivePlanRecord> {
    Ok(db.load_active_plan()?.unwrap_or_else(|| ActivePlanRecord {
        plan: default_plan(),
        id: None,
    }))
}

/// Pick the plan to play: a file, a saved plan, or the active plan.
pub fn resolve(db: &Database, id: Option<&str>, file: Option<&Path>) -> Result<Plan> {
    if let Some(path) = file {
        return read_plan_file(path);
    }
    if let Some(id) = id {
        let saved = db
            .get_saved_plan(id)?
            .ok_or_else(|| DatabaseError::PlanNotFound(id.to_string()))?;
        return Ok(saved.data);
    }
    Ok(active_or_default(db)?.plan)
}

pub fn run(action: PlanAction) -> Result<()> {
    let db = Database::open()?;

    match action {
        PlanAction::Show { steps } => {
            let record = active_or_default(&db)?;
            if steps {
                let sequence = build_sequence(&record.plan, &RoundsConfig::defaults_for(&record.plan));
                println!("{}", serde_json::to_string_pretty(&sequence)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        PlanAction::List => {
            let summaries: Vec<_> = db
                .list_saved_plans()?
                .into_iter()
                .map(|p| {
                    serde_json::json!({
                        "id": p.id,
                        "title": p.title,
                        "createdAt": p.created_at,
                        "sections": p.data.sections.len(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        PlanAction::Save { title, file } => {
            let plan = match file {
                Some(path) => read_plan_file(&path)?,
                None => active_or_default(&db)?.plan,
            };
            let saved = db.save_plan(&title, &plan)?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        PlanAction::Delete { id } => {
            if db.get_saved_plan(&id)?.is_none() {
                return Err(DatabaseError::PlanNotFound(id).into());
            }
            db.delete_plan(&id)?;
            println!("deleted {id}");
        }
        PlanAction::Use { id } => {
            let saved = db
                .get_saved_plan(&id)?
                .ok_or_else(|| DatabaseError::PlanNotFound(id.clone()))?;
            db.save_active_plan(&saved.data, Some(&saved.id))?;
            println!("active plan: {} ({})", saved.title, saved.id);
        }
        PlanAction::Import { path, title } => {
            let plan = read_plan_file(&path)?;
            match title {
                Some(title) => {
                    let saved = db.save_plan(&title, &plan)?;
                    db.save_active_plan(&plan, Some(&saved.id))?;
                    println!("{}", serde_json::to_string_pretty(&saved)?);
                }
                None => {
                    db.save_active_plan(&plan, None)?;
                    println!("imported {}", path.display());
                }
            }
        }
        PlanAction::Clear => {
            db.clear_active_plan()?;
            println!("active plan cleared");
        }
    }
    Ok(())
}
