//! Company and system tool definitions

use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use switchyard_core::{Error, Result};
use switchyard_llm::ToolSpec;

use crate::execution::ExecutionConfig;
use crate::system;
use crate::tool::{NewTool, Tool, ToolType, ToolUpdate};

/// Outcome of [`ToolRegistry::sync_company_tools`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// In-memory tool store
///
/// Names are unique across one company's namespace plus the shared
/// system namespace. Company keys are lower-cased.
#[derive(Default)]
pub struct ToolRegistry {
    system: DashMap<String, Tool>,
    companies: DashMap<String, IndexMap<String, Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in system tools already seeded
    pub fn with_system_tools() -> Self {
        let registry = Self::new();
        registry.register_system_tools();
        registry
    }

    /// Replace the system tool set with the built-in definitions
    pub fn register_system_tools(&self) -> usize {
        self.system.clear();
        for def in system::definitions() {
            self.system.insert(
                def.name.clone(),
                Tool {
                    name: def.name,
                    description: def.description,
                    parameters: def.parameters,
                    tool_type: ToolType::System,
                    execution_config: None,
                    is_active: true,
                },
            );
        }
        tracing::info!(count = self.system.len(), "system tools registered");
        self.system.len()
    }

    pub fn is_system_tool(&self, name: &str) -> bool {
        self.system.contains_key(name)
    }

    /// Checked against the trimmed name the tool is stored under
    fn ensure_not_system(&self, name: &str) -> Result<()> {
        if self.is_system_tool(name) {
            return Err(Error::DuplicateEntry(format!("tool '{name}' collides with a system tool")));
        }
        Ok(())
    }

    pub fn create_tool(&self, company: &str, new_tool: NewTool) -> Result<Tool> {
        let tool = build_tool(new_tool)?;
        self.ensure_not_system(&tool.name)?;

        let mut tools = self.companies.entry(company.to_lowercase()).or_default();
        if tools.contains_key(&tool.name) {
            return Err(Error::DuplicateEntry(format!(
                "tool '{}' already exists for company '{company}'",
                tool.name
            )));
        }

        tracing::info!(company = %company, tool = %tool.name, tool_type = %tool.tool_type, "tool created");
        tools.insert(tool.name.clone(), tool.clone());
        Ok(tool)
    }

    pub fn update_tool(&self, company: &str, name: &str, update: ToolUpdate) -> Result<Tool> {
        if self.is_system_tool(name) {
            return Err(Error::InvalidOperation(format!("system tool '{name}' cannot be modified")));
        }

        let mut tools = self
            .companies
            .get_mut(&company.to_lowercase())
            .ok_or_else(|| not_registered(company, name))?;
        let current = tools.get(name).ok_or_else(|| not_registered(company, name))?;

        let mut next = current.clone();
        if let Some(description) = update.description {
            next.description = description;
        }
        if let Some(parameters) = update.parameters {
            next.parameters = parameters;
        }
        if let Some(is_active) = update.is_active {
            next.is_active = is_active;
        }
        if let Some(config) = update.execution_config {
            next.execution_config = Some(ExecutionConfig::parse(&config)?);
        }
        if next.tool_type == ToolType::Http && next.execution_config.is_none() {
            return Err(Error::MissingParameter(format!("HTTP tool '{name}' requires an execution_config")));
        }

        tracing::info!(company = %company, tool = %name, "tool updated");
        tools.insert(name.to_owned(), next.clone());
        Ok(next)
    }

    pub fn delete_tool(&self, company: &str, name: &str) -> Result<()> {
        if self.is_system_tool(name) {
            return Err(Error::InvalidOperation(format!("system tool '{name}' cannot be deleted")));
        }

        let removed = self
            .companies
            .get_mut(&company.to_lowercase())
            .and_then(|mut tools| tools.shift_remove(name));

        match removed {
            Some(_) => {
                tracing::info!(company = %company, tool = %name, "tool deleted");
                Ok(())
            }
            None => Err(not_registered(company, name)),
        }
    }

    /// Upsert every definition and drop company tools no longer listed
    ///
    /// All definitions are validated before anything is written, so a bad
    /// entry leaves the company's tools untouched.
    pub fn sync_company_tools(&self, company: &str, definitions: Vec<NewTool>) -> Result<SyncSummary> {
        let mut desired = IndexMap::new();
        for def in definitions {
            let tool = build_tool(def)?;
            self.ensure_not_system(&tool.name)?;
            if desired.insert(tool.name.clone(), tool).is_some() {
                return Err(Error::DuplicateEntry("tool names must be unique within a sync".to_owned()));
            }
        }

        let mut tools = self.companies.entry(company.to_lowercase()).or_default();
        let mut summary = SyncSummary::default();

        let before = tools.len();
        tools.retain(|name, _| desired.contains_key(name));
        summary.deleted = before - tools.len();

        for (name, tool) in desired {
            if tools.insert(name, tool).is_some() {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
        }

        tracing::info!(
            company = %company,
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            "company tools synced"
        );
        Ok(summary)
    }

    /// Resolve a callable tool: active company tools first, then system tools
    pub fn lookup(&self, company: &str, name: &str) -> Result<Tool> {
        if let Some(tools) = self.companies.get(&company.to_lowercase()) {
            if let Some(tool) = tools.get(name) {
                if tool.is_active {
                    return Ok(tool.clone());
                }
                return Err(not_registered(company, name));
            }
        }

        self.system
            .get(name)
            .map(|tool| tool.value().clone())
            .ok_or_else(|| not_registered(company, name))
    }

    /// Every tool a company's model may call
    pub fn company_tools(&self, company: &str) -> Vec<Tool> {
        self.companies
            .get(&company.to_lowercase())
            .map(|tools| tools.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Active company tools followed by system tools, in strict schema form
    pub fn tools_for_llm(&self, company: &str) -> Vec<ToolSpec> {
        let mut system: Vec<Tool> = self.system.iter().map(|t| t.value().clone()).collect();
        system.sort_by(|a, b| a.name.cmp(&b.name));

        self.company_tools(company)
            .into_iter()
            .filter(|tool| tool.is_active)
            .chain(system)
            .map(|tool| ToolSpec {
                name: tool.name,
                description: tool.description,
                parameters: strict_parameters(tool.parameters),
                strict: true,
            })
            .collect()
    }
}

fn not_registered(company: &str, name: &str) -> Error {
    Error::ToolNotRegistered(format!("tool '{name}' not registered for company '{company}'"))
}

fn build_tool(new_tool: NewTool) -> Result<Tool> {
    if new_tool.name.trim().is_empty() {
        return Err(Error::MissingParameter("tool name".to_owned()));
    }
    if new_tool.tool_type == ToolType::System {
        return Err(Error::InvalidOperation(format!(
            "system tool '{}' cannot be created from company definitions",
            new_tool.name
        )));
    }

    let execution_config = match (new_tool.tool_type, new_tool.execution_config) {
        (ToolType::Http, Some(config)) => Some(ExecutionConfig::parse(&config)?),
        (ToolType::Http, None) => {
            return Err(Error::MissingParameter(format!(
                "HTTP tool '{}' requires an execution_config",
                new_tool.name
            )));
        }
        (_, _) => None,
    };

    Ok(Tool {
        name: new_tool.name.trim().to_owned(),
        description: new_tool.description,
        parameters: new_tool.parameters,
        tool_type: new_tool.tool_type,
        execution_config,
        is_active: new_tool.is_active,
    })
}

/// Force `additionalProperties = false` on object schemas
fn strict_parameters(parameters: Value) -> Value {
    match parameters {
        Value::Object(mut map) => {
            map.insert("additionalProperties".to_owned(), Value::Bool(false));
            Value::Object(map)
        }
        Value::Null => serde_json::json!({"type": "object", "properties": {}, "additionalProperties": false}),
        other => other,
    }
}
