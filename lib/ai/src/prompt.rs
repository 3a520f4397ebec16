//! Prompt templates.
//!
//! Templates use `{{variable_name}}` placeholders. Rendering fails when a
//! required variable is not supplied.

use crate::error::PromptError;
use std::collections::HashMap;

/// Definition of a template variable.
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    /// What the variable holds. Reported when a required value is missing.
    pub description: String,
    /// Whether this variable is required.
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<String>,
}

impl VariableDefinition {
    /// Creates a required variable definition.
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// Creates an optional variable definition.
    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: false,
            default: None,
        }
    }

    /// Sets a default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A named prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template name (used in error context and logs).
    pub name: String,
    /// Template content with placeholders.
    pub content: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Variable definitions (name -> definition).
    pub variables: HashMap<String, VariableDefinition>,
}

impl PromptTemplate {
    /// Creates a new prompt template.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            system_prompt: None,
            variables: HashMap::new(),
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    /// Adds a variable definition.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        definition: VariableDefinition,
    ) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Renders the template with the given variables.
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` when a required variable without a default
    /// is absent.
    pub fn render(&self, variables: &HashMap<&str, &str>) -> Result<String, PromptError> {
        let mut resolved: HashMap<&str, &str> = HashMap::with_capacity(self.variables.len());
        for (name, def) in &self.variables {
            let value = match (variables.get(name.as_str()), &def.default) {
                (Some(value), _) => *value,
                (None, Some(default)) => default.as_str(),
                (None, None) if def.required => {
                    return Err(PromptError::MissingVariable {
                        template: self.name.clone(),
                        variable: name.clone(),
                        description: def.description.clone(),
                    });
                }
                (None, None) => "",
            };
            resolved.insert(name.as_str(), value);
        }

        // Single pass, so substituted values are never expanded again.
        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();
        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) if resolved.contains_key(&after[..end]) => {
                    result.push_str(resolved[&after[..end]]);
                    rest = &after[end + 2..];
                }
                _ => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }
        result.push_str(rest);

        Ok(result)
    }
}

/// Name of the domain-validation template.
pub const QUESTION_VALIDATOR: &str = "question_validator";
/// Name of the documentation-summary template.
pub const DOCS_SUMMARIZER: &str = "docs_summarizer";
/// Name of the YAML generation template.
pub const YAML_GENERATOR: &str = "yaml_generator";

/// Builds the template used to decide whether a question is in-domain and
/// whether it asks for YAML.
#[must_use]
pub fn question_validator() -> PromptTemplate {
    PromptTemplate::new(
        QUESTION_VALIDATOR,
        "Instructions:\n\
         - You are a question classifying tool\n\
         - You are an expert in Kubernetes and OpenShift\n\
         - Your job is to determine if a question is about Kubernetes or OpenShift \
         and to provide a one-word response\n\
         - If a question is not about Kubernetes or OpenShift, answer with only the \
         word INVALID\n\
         - If a question is about Kubernetes or OpenShift, answer with the word VALID\n\
         - If a question is not about creating kubernetes or openshift yaml, answer \
         with the word NOYAML\n\
         - If a question is about creating kubernetes or openshift yaml, add the word YAML\n\
         - Use a comma to separate the words\n\
         - Do not provide explanation, only respond with the chosen words\n\
         \n\
         Example Question:\n\
         Can you make me lunch with ham and cheese?\n\
         Example Response:\n\
         INVALID,NOYAML\n\
         \n\
         Example Question:\n\
         Why is the sky blue?\n\
         Example Response:\n\
         INVALID,NOYAML\n\
         \n\
         Example Question:\n\
         Can you help configure my cluster to automatically scale?\n\
         Example Response:\n\
         VALID,NOYAML\n\
         \n\
         Example Question:\n\
         please give me a vertical pod autoscaler configuration to manage my frontend \
         deployment automatically. Don't update the workload if there are less than 2 \
         pods running.\n\
         Example Response:\n\
         VALID,YAML\n\
         \n\
         Question:\n\
         {{query}}\n\
         Response:\n",
    )
    .with_variable("query", VariableDefinition::required("The user's question"))
}

/// Builds the template used for free-form explanatory answers.
#[must_use]
pub fn docs_summarizer() -> PromptTemplate {
    PromptTemplate::new(
        DOCS_SUMMARIZER,
        "The following is a question about Kubernetes or OpenShift. Answer it \
         accurately and concisely, as an experienced cluster administrator would. \
         If you do not know the answer, say so rather than guessing.\n\
         \n\
         Question:\n\
         {{query}}\n\
         \n\
         Answer:\n",
    )
    .with_system_prompt("You are an assistant for Kubernetes and OpenShift administrators.")
    .with_variable("query", VariableDefinition::required("The user's question"))
}

/// Builds the template used for YAML generation.
#[must_use]
pub fn yaml_generator() -> PromptTemplate {
    PromptTemplate::new(
        YAML_GENERATOR,
        "Instructions:\n\
         - Produce only a valid Kubernetes or OpenShift YAML document\n\
         - Do not add explanation, commentary or markdown formatting\n\
         - If the request cannot be expressed as YAML, respond with only the word \
         SOME_FAILURE\n\
         \n\
         Previous conversation:\n\
         {{history}}\n\
         \n\
         Request:\n\
         {{query}}\n\
         \n\
         YAML:\n",
    )
    .with_system_prompt("You are an assistant that writes Kubernetes and OpenShift manifests.")
    .with_variable("query", VariableDefinition::required("The user's request"))
    .with_variable(
        "history",
        VariableDefinition::optional("Earlier turns of this conversation").with_default("(none)"),
    )
}
