use clap::{Parser, Subcommand, ValueEnum};
use gridorm::{to_simple_object, ColumnKind, Entity, Orm, StaticIdentity, Value};
use std::path::PathBuf;
use std::process;

/// GridORM CLI — work with typed records in a workbook from the command line
#[derive(Parser)]
#[command(name = "gridorm", version, about)]
struct Cli {
    /// Path to the data directory holding schema.yaml and workbook.json
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    /// Acting user recorded in createdBy / lastModifiedBy
    /// (default: $GRIDORM_ACTOR)
    #[arg(long)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create or reshape a record type's table and print its headers
    Sync {
        /// Record type (omit to sync every type)
        record: Option<String>,
    },

    /// List all records of a type
    List {
        /// Record type
        record: String,
        /// Resolve foreign keys one hop deep
        #[arg(long)]
        expand: bool,
    },

    /// Get a single record by ID
    Get {
        /// Record type
        record: String,
        /// Record ID
        id: String,
        /// Resolve foreign keys one hop deep
        #[arg(long)]
        expand: bool,
    },

    /// Insert a new record
    Insert {
        /// Record type
        record: String,
        /// Column values (e.g. --field name=widget)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Update an existing record
    Update {
        /// Record type
        record: String,
        /// Record ID
        id: String,
        /// Column values to change (e.g. --field qty=6)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },

    /// Delete a record
    Delete {
        /// Record type
        record: String,
        /// Record ID
        id: String,
        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Show settings and row counts per record type
    Status,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| {
        format!("Invalid key=value pair: no '=' found in '{s}'")
    })?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut orm = Orm::open(&cli.data_dir)?;
    log::debug!("Opened data directory {}", cli.data_dir.display());
    if let Some(actor) = cli.actor {
        orm = orm.with_identity(StaticIdentity(actor));
    }

    match cli.command {
        Command::Sync { record } => {
            let resolved = match record {
                Some(name) => vec![orm.sync(&name)?],
                None => orm.sync_all()?,
            };
            let tables: serde_json::Map<String, serde_json::Value> = resolved
                .into_iter()
                .map(|r| (r.table.name().to_string(), serde_json::json!(r.headers)))
                .collect();
            print_output(&serde_json::Value::Object(tables), &cli.format)?;
        }

        Command::List { record, expand } => {
            let mut items = Vec::new();
            for mut entity in orm.find_all(&record)? {
                if expand {
                    orm.expand(&mut entity)?;
                }
                items.push(entity_to_json(&entity));
            }
            print_output(&serde_json::Value::Array(items), &cli.format)?;
        }

        Command::Get { record, id, expand } => {
            let mut entity = find(&orm, &record, &id)?;
            if expand {
                orm.expand(&mut entity)?;
            }
            print_output(&entity_to_json(&entity), &cli.format)?;
        }

        Command::Insert { record, fields } => {
            let mut entity = orm.new_entity(&record)?;
            apply_fields(&mut entity, &fields)?;
            orm.persist(&mut entity)?;
            print_output(
                &serde_json::json!({ "id": entity.id(), "row": entity.row_number() }),
                &cli.format,
            )?;
        }

        Command::Update { record, id, fields } => {
            let mut entity = find(&orm, &record, &id)?;
            apply_fields(&mut entity, &fields)?;
            orm.persist(&mut entity)?;
            print_output(&serde_json::json!({ "ok": true, "id": id }), &cli.format)?;
        }

        Command::Delete {
            record,
            id,
            dry_run,
        } => {
            let mut entity = find(&orm, &record, &id)?;
            if dry_run {
                print_output(
                    &serde_json::json!({
                        "dry_run": true,
                        "would_delete": { "record": record, "id": id, "row": entity.row_number() },
                        "document": entity_to_json(&entity),
                    }),
                    &cli.format,
                )?;
            } else {
                orm.remove(&mut entity)?;
                print_output(&serde_json::json!({ "ok": true, "deleted": id }), &cli.format)?;
            }
        }

        Command::Status => {
            let result = orm.status()?;
            print_output(&result, &cli.format)?;
        }
    }

    Ok(())
}

fn find(orm: &Orm, record: &str, id: &str) -> Result<Entity, Box<dyn std::error::Error>> {
    orm.find_by_id(record, id)?
        .ok_or_else(|| format!("Record not found: {record}/{id}").into())
}

fn entity_to_json(entity: &Entity) -> serde_json::Value {
    let mut object = to_simple_object(entity);
    object.insert("rowNumber".into(), serde_json::json!(entity.row_number()));
    serde_json::Value::Object(object)
}

fn apply_fields(entity: &mut Entity, fields: &[(String, String)]) -> gridorm::Result<()> {
    for (key, val) in fields {
        let kind = entity.schema().column(key).map(|c| c.kind);
        let value = match kind {
            // Text columns take the argument verbatim
            Some(ColumnKind::String | ColumnKind::ForeignKey) => Value::Text(val.clone()),
            // Try to parse as JSON value (for numbers and booleans)
            _ => {
                let json_val =
                    serde_json::from_str(val).unwrap_or(serde_json::Value::String(val.clone()));
                Value::from_json(&json_val)
            }
        };
        entity.set(key, value)?;
    }
    Ok(())
}

fn print_output(
    value: &serde_json::Value,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridorm::{Column, RecordSchema};
    use std::sync::Arc;

    fn item() -> Entity {
        let schema = RecordSchema::builder("Item")
            .column(Column::string("name"))
            .column(Column::number("qty"))
            .column(Column::boolean("fragile").optional())
            .build()
            .unwrap();
        Entity::new(Arc::new(schema))
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("name=a=b").unwrap(),
            ("name".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("name").is_err());
    }

    #[test]
    fn test_string_fields_are_taken_verbatim() {
        let mut entity = item();
        apply_fields(&mut entity, &fields(&[("name", "1e3")])).unwrap();
        assert_eq!(entity.get("name"), Some(&Value::from("1e3")));

        apply_fields(&mut entity, &fields(&[("name", "null")])).unwrap();
        assert_eq!(entity.get("name"), Some(&Value::from("null")));
    }

    #[test]
    fn test_other_fields_parse_as_json() {
        let mut entity = item();
        apply_fields(&mut entity, &fields(&[("qty", "1e3"), ("fragile", "true")])).unwrap();
        assert_eq!(entity.get("qty"), Some(&Value::Number(1000.0)));
        assert_eq!(entity.get("fragile"), Some(&Value::Bool(true)));
    }
}
