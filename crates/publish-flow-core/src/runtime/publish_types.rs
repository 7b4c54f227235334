// crates/publish-flow-core/src/runtime/publish_types.rs
// ============================================================================
// Module: Publish Type Registry
// Description: Per-publish-type extractor, schema, and rule bundles.
// Purpose: Route submissions to the pipeline for their publish type.
// Dependencies: thiserror, tracing, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Each publish type contributes a [`PublishTypeHandler`] bundling its field
//! extractor, schema, and rule engine. The [`PublishTypeRegistry`] maps the
//! type tag to its handler, and [`validate_submission`] runs the shared
//! pipeline: extract, validate fields, apply rules, reduce.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::core::FieldValue;
use crate::core::LoadTestContext;
use crate::core::Locale;
use crate::core::PublishType;
use crate::core::RawFieldMap;
use crate::core::ValidationOutcome;
use crate::core::field;
use crate::interfaces::ReachabilityProbe;
use crate::interfaces::RegistryError;
use crate::interfaces::RegistryStore;
use crate::runtime::extractor::FieldExtractor;
use crate::runtime::reachability::ReachabilityCache;
use crate::runtime::reducer::ReportReducer;
use crate::runtime::rules::PluginRuleEngine;
use crate::runtime::rules::PublishRules;
use crate::runtime::rules::RuleContext;
use crate::runtime::schema::Schema;
use crate::runtime::schema::SchemaError;
use crate::runtime::schema::SchemaValidator;
use crate::runtime::schema::ValidationContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Publish type registry errors.
#[derive(Debug, Error)]
pub enum PublishTypeError {
    /// No handler is registered for the publish type.
    #[error("no handler registered for publish type {0}")]
    Unsupported(PublishType),
    /// A handler could not be constructed.
    #[error("publish type handler construction failed: {0}")]
    Schema(#[from] SchemaError),
    /// A handler extractor could not be constructed.
    #[error("publish type extractor construction failed: {0}")]
    Extractor(#[from] regex::Error),
}

// ============================================================================
// SECTION: Submission
// ============================================================================

/// Text and submitter of one submission.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    /// Issue body.
    pub body: &'a str,
    /// Login of the submitter.
    pub author: Option<&'a str>,
}

/// Collaborators and context for one validation run.
pub struct ValidationEnv<'a> {
    /// Message language.
    pub locale: Locale,
    /// Load-test outcome.
    pub load_test: &'a LoadTestContext,
    /// URL probe.
    pub probe: &'a dyn ReachabilityProbe,
    /// Probe memo owned by the caller.
    pub cache: &'a mut ReachabilityCache,
    /// Registry consulted for the previous record.
    pub registry: &'a dyn RegistryStore,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Pipeline components for one publish type.
pub trait PublishTypeHandler {
    /// Returns the publish type handled.
    fn publish_type(&self) -> PublishType;

    /// Returns the body extractor.
    fn extractor(&self) -> &FieldExtractor;

    /// Returns the field schema.
    fn schema(&self) -> &Schema;

    /// Returns the cross-field rules.
    fn rules(&self) -> &dyn PublishRules;

    /// Builds the raw field map for a submission.
    fn raw_fields(&self, submission: &Submission<'_>, load_test: &LoadTestContext) -> RawFieldMap {
        let mut raw = self.extractor().extract(submission.body);
        raw.insert_opt(field::AUTHOR, submission.author.map(FieldValue::from));
        if let Some(metadata) = &load_test.metadata {
            raw.insert(field::DESCRIPTION, metadata.description.clone());
            raw.insert(field::USAGE, metadata.usage.clone());
            raw.insert(field::PLUGIN_TYPE, metadata.plugin_type.clone());
            raw.insert(field::VERSION, metadata.version.clone());
        }
        raw
    }
}

/// Handler for plugin submissions.
#[derive(Debug, Clone)]
pub struct PluginHandler {
    /// Body extractor.
    extractor: FieldExtractor,
    /// Field schema.
    schema: Schema,
    /// Cross-field rules.
    rules: PluginRuleEngine,
}

impl PluginHandler {
    /// Creates the plugin handler.
    ///
    /// # Errors
    ///
    /// Returns [`PublishTypeError`] when a built-in pattern fails to compile.
    pub fn new() -> Result<Self, PublishTypeError> {
        Ok(Self {
            extractor: FieldExtractor::plugin()?,
            schema: Schema::plugin()?,
            rules: PluginRuleEngine,
        })
    }
}

impl PublishTypeHandler for PluginHandler {
    fn publish_type(&self) -> PublishType {
        PublishType::Plugin
    }

    fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rules(&self) -> &dyn PublishRules {
        &self.rules
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Publish type tag to handler mapping.
#[derive(Default)]
pub struct PublishTypeRegistry {
    /// Handlers by publish type.
    handlers: BTreeMap<PublishType, Box<dyn PublishTypeHandler>>,
}

impl PublishTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in handler.
    ///
    /// # Errors
    ///
    /// Returns [`PublishTypeError`] when a built-in handler fails to build.
    pub fn builtin() -> Result<Self, PublishTypeError> {
        let mut registry = Self::new();
        registry.register(PluginHandler::new()?);
        Ok(registry)
    }

    /// Registers a handler, replacing any existing one for its type.
    pub fn register(&mut self, handler: impl PublishTypeHandler + 'static) {
        self.handlers.insert(handler.publish_type(), Box::new(handler));
    }

    /// Returns the handler for `publish_type`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishTypeError::Unsupported`] when no handler exists.
    pub fn handler(
        &self,
        publish_type: PublishType,
    ) -> Result<&dyn PublishTypeHandler, PublishTypeError> {
        self.handlers
            .get(&publish_type)
            .map(|handler| &**handler)
            .ok_or(PublishTypeError::Unsupported(publish_type))
    }

    /// Returns the registered publish types in order.
    pub fn publish_types(&self) -> impl Iterator<Item = PublishType> + '_ {
        self.handlers.keys().copied()
    }
}

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Runs extraction, field validation, rules, and reduction for a submission.
///
/// # Errors
///
/// Returns [`RegistryError`] when the previous registry entry cannot be read.
pub fn validate_submission(
    handler: &dyn PublishTypeHandler,
    submission: &Submission<'_>,
    env: &mut ValidationEnv<'_>,
) -> Result<ValidationOutcome, RegistryError> {
    let raw = handler.raw_fields(submission, env.load_test);
    debug!(publish_type = %handler.publish_type(), fields = raw.len(), "extracted raw fields");

    let mut ctx = ValidationContext {
        locale: env.locale,
        probe: env.probe,
        cache: &mut *env.cache,
    };
    let validation = SchemaValidator::validate(handler.schema(), &raw, &mut ctx);

    let previous = match raw.text(field::NAME) {
        Some(name) => env.registry.lookup(name)?,
        None => None,
    };
    let rule_ctx = RuleContext {
        previous: previous.as_ref(),
        load_test: env.load_test,
        locale: env.locale,
    };
    let validation = handler.rules().apply(&rule_ctx, validation);

    let outcome = ReportReducer::reduce(handler.publish_type(), &raw, validation);
    debug!(valid = outcome.valid, errors = outcome.errors.len(), name = %outcome.name, "validated submission");
    Ok(outcome)
}
