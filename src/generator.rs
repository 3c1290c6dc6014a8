//! Emission driver: classify, resolve, reconcile, render, write.
//!
//! One [`Generator`] is one run. Declarations are processed strictly in model
//! order; a failure that concerns a single declaration is recorded in the
//! [`GenerationReport`] and the run moves on. Only setup, render and write
//! failures abort.
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::attributes::{
    event_name, CommonAttributes, EventAttributes, MessageAttributes, TemplateAttributes,
};
use crate::config::GeneratorConfig;
use crate::error::{GenError, SkipReason};
use crate::model::{simple_type_name, Declaration, DeclarationModel};
use crate::partner::{resolve_partner, NameIndex, PartnerLookup};
use crate::reconcile::reconcile;
use crate::templates::Renderer;
use crate::variant::{classify, Variant};

// ------------------------------- Types ----------------------------------- //

/// Everything resolved for one tagged declaration.
#[derive(Debug, Clone)]
pub struct GenerationJob<'m> {
    pub declaration: &'m Declaration,
    pub variant: Variant,
    /// Simple name of the declaration's superclass; the generated class.
    pub class_name: String,
    pub super_class: String,
    pub partner: Option<&'m Declaration>,
    pub attributes: TemplateAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub tag: Variant,
    pub declaration: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "{level}: @{} {}: {}", self.tag, self.declaration, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub declaration: String,
    pub variant: Variant,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Directory to compile together with the rest of the project.
    pub source_root: PathBuf,
    pub generated: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
    pub dry_run: bool,
}

impl GenerationReport {
    /// Declarations that were tagged but produced no output.
    pub fn skipped(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == Level::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == Level::Warning)
    }
}

// ------------------------------ Generator -------------------------------- //

pub struct Generator<'m, R> {
    model: &'m DeclarationModel,
    index: NameIndex<'m>,
    renderer: R,
    config: GeneratorConfig,
}

impl<'m, R: Renderer> Generator<'m, R> {
    pub fn new(model: &'m DeclarationModel, renderer: R, config: GeneratorConfig) -> Self {
        Self { model, index: NameIndex::new(model), renderer, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Names looked up in the model so far.
    pub fn lookups(&self) -> usize {
        self.index.cached_len()
    }

    pub fn run(mut self) -> Result<GenerationReport, GenError> {
        let mut report = GenerationReport {
            source_root: self.config.output_dir.clone(),
            dry_run: self.config.dry_run,
            ..GenerationReport::default()
        };
        let mut written: HashMap<PathBuf, String> = HashMap::new();

        let model = self.model;
        for decl in model {
            let Some(job) = self.plan(decl, &mut report.diagnostics) else { continue };
            let text = self.renderer.render(&job.attributes)?;
            let path = self.output_path(&job);

            let qualified = decl.qualified_name();
            if let Some(previous) = written.insert(path.clone(), qualified.clone()) {
                diagnose(
                    &mut report.diagnostics,
                    Level::Warning,
                    job.variant,
                    decl,
                    format!("overwrites {} generated for {previous}", path.display()),
                );
            }
            if !self.config.dry_run {
                write_file(&path, &text)?;
            }
            tracing::debug!(path = %path.display(), "{}.{} :\n{text}", job.class_name, self.config.extension);

            report.generated.push(GeneratedFile { path, declaration: qualified, variant: job.variant });
        }

        tracing::info!(
            generated = report.generated.len(),
            skipped = report.skipped().count(),
            warnings = report.warnings().count(),
            dry_run = report.dry_run,
            "generation finished"
        );
        Ok(report)
    }

    /// Resolve one declaration. `None` when it is untagged or skipped; skips
    /// and warnings land in `diagnostics`.
    pub fn plan(
        &mut self,
        decl: &'m Declaration,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<GenerationJob<'m>> {
        let classification = match classify(decl, self.config.multi_tag_policy) {
            Ok(Some(c)) => c,
            Ok(None) => return None,
            Err(reason) => {
                let tag = match &reason {
                    SkipReason::MultipleVariants(vs) => vs.first().copied().unwrap_or(Variant::Event),
                    SkipReason::NoSuperclass => Variant::Event,
                };
                diagnose(diagnostics, Level::Error, tag, decl, skip_message(&reason));
                return None;
            }
        };
        let variant = classification.variant;
        if !classification.ignored.is_empty() {
            let ignored: Vec<_> = classification.ignored.iter().map(|v| v.name()).collect();
            diagnose(
                diagnostics,
                Level::Warning,
                variant,
                decl,
                format!("also tagged {}; using @{variant}", ignored.join(", ")),
            );
        }

        let Some(class_name) = decl.superclass_name() else {
            diagnose(diagnostics, Level::Error, variant, decl, skip_message(&SkipReason::NoSuperclass));
            return None;
        };

        let partner = match resolve_partner(decl, variant, &self.config.naming, &mut self.index) {
            PartnerLookup::Found(partner) => Some(partner),
            PartnerLookup::NotApplicable => None,
            PartnerLookup::Missing { expected } => {
                tracing::debug!(tag = %variant, declaration = %decl.qualified_name(), expected = %expected, "no partner declaration");
                None
            }
            PartnerLookup::NamingMismatch { name } => {
                diagnose(
                    diagnostics,
                    Level::Warning,
                    variant,
                    decl,
                    format!(
                        "`{name}` does not follow the Event|Request|Response naming convention (`{}`); partner not resolved",
                        self.config.naming.pattern()
                    ),
                );
                None
            }
        };

        let super_class = classification.effective_superclass();
        let common = CommonAttributes {
            package_name: decl.package.clone(),
            class_name: class_name.to_string(),
            subclass_name: decl.name.clone(),
            event_name: event_name(&decl.name).to_string(),
            constructors: reconcile(Some(decl), None),
            super_class: super_class.to_string(),
        };
        let attributes = match variant {
            Variant::Event => TemplateAttributes::Event(EventAttributes { common }),
            Variant::Request | Variant::Response => {
                let base = self.index.lookup(simple_type_name(super_class));
                TemplateAttributes::Message(MessageAttributes {
                    variant,
                    common,
                    superclass_constructors: reconcile(base, partner),
                    partner_class: partner.map(|p| p.name.clone()),
                })
            }
        };

        Some(GenerationJob {
            declaration: decl,
            variant,
            class_name: class_name.to_string(),
            super_class: super_class.to_string(),
            partner,
            attributes,
        })
    }

    /// `<output_dir>/<package as path>/<className>.<extension>`
    pub fn output_path(&self, job: &GenerationJob<'_>) -> PathBuf {
        let mut path = self.config.output_dir.clone();
        for segment in job.declaration.package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.{}", job.class_name, self.config.extension));
        path
    }
}

fn skip_message(reason: &SkipReason) -> String {
    format!("could not generate; {reason}")
}

fn diagnose(
    out: &mut Vec<Diagnostic>,
    level: Level,
    tag: Variant,
    decl: &Declaration,
    message: String,
) {
    let declaration = decl.qualified_name();
    match level {
        Level::Warning => tracing::warn!(tag = %tag, declaration = %declaration, "{message}"),
        Level::Error => tracing::error!(tag = %tag, declaration = %declaration, "{message}"),
    }
    out.push(Diagnostic { level, tag, declaration, message });
}

fn write_file(path: &Path, text: &str) -> Result<(), GenError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| GenError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| GenError::Write { path: path.to_path_buf(), source })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::Value;

    use super::*;
    use crate::attributes::RenderableAttributes;
    use crate::model::{Constructor, Param, Tag, TypeRef};
    use crate::partner::{NamingConvention, PartnerNameSource};
    use crate::templates::Templates;
    use crate::variant::MultiTagPolicy;

    /// Records attributes instead of rendering them.
    #[derive(Default)]
    struct Capture {
        seen: RefCell<Vec<(&'static str, Value)>>,
    }

    impl Renderer for &Capture {
        fn render<A: RenderableAttributes>(&self, attributes: &A) -> Result<String, GenError> {
            let value = serde_json::to_value(attributes).unwrap();
            self.seen.borrow_mut().push((attributes.template_name(), value));
            Ok(attributes.template_name().to_string())
        }
    }

    fn tagged(package: &str, name: &str, tag: &str, superclass: Option<&str>) -> Declaration {
        let decl = Declaration::new(package, name).with_tag(Tag::new(tag));
        match superclass {
            Some(s) => decl.with_superclass(s),
            None => decl,
        }
    }

    fn abstract_request() -> Declaration {
        Declaration::new("", "AbstractRequest").with_constructor(Constructor::new(
            "AbstractRequest",
            vec![
                Param::new(TypeRef::unresolved("R"), "prototype"),
                Param::new(TypeRef::resolved("Map<String, R>"), "extra"),
            ],
        ))
    }

    fn run_captured(model: &DeclarationModel, config: GeneratorConfig) -> (GenerationReport, Vec<(&'static str, Value)>) {
        let capture = Capture::default();
        let report = Generator::new(model, &capture, config).run().unwrap();
        (report, capture.seen.into_inner())
    }

    #[test]
    fn scenario_event_with_default_superclass() {
        let dir = tempfile::tempdir().unwrap();
        let model = DeclarationModel::from_declarations([tagged("", "FooEvent", "event", Some("Bar"))]);
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));

        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].path, dir.path().join("Bar.java"));
        let (template, attrs) = &seen[0];
        assert_eq!(*template, "event");
        assert_eq!(attrs["eventName"], "Foo");
        assert_eq!(attrs["superClass"], "GwtEvent");
        assert_eq!(attrs["className"], "Bar");
        assert_eq!(attrs["subclassName"], "FooEvent");
        assert!(attrs.get("partnerClass").is_none());
    }

    #[test]
    fn scenario_request_with_partner_rewrites_generic_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let model = DeclarationModel::from_declarations([
            tagged("", "FooRequest", "request", Some("BarReq")),
            Declaration::new("", "FooResponse"),
            abstract_request(),
        ]);
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));

        assert_eq!(report.generated.len(), 1);
        assert!(report.diagnostics.is_empty());
        let (template, attrs) = &seen[0];
        assert_eq!(*template, "request");
        assert_eq!(attrs["superClass"], "AbstractRequest");
        assert_eq!(attrs["partnerClass"], "FooResponse");
        let args = &attrs["superclassConstructors"][0]["args"];
        assert_eq!(args[0]["type"], "FooResponse");
        assert_eq!(args[0]["name"], "prototype");
        assert_eq!(args[1]["type"], "Map<String, R>");
    }

    #[test]
    fn scenario_missing_superclass_is_skipped_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let model = DeclarationModel::from_declarations([
            tagged("app", "LostRequest", "request", None),
            tagged("app", "FooEvent", "event", Some("Bar")),
        ]);
        let (report, _) = run_captured(&model, GeneratorConfig::new(dir.path()));

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].declaration, "app.LostRequest");
        assert_eq!(skipped[0].tag, Variant::Request);
        assert!(skipped[0].message.contains("no superclass specified"));
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].declaration, "app.FooEvent");
    }

    #[test]
    fn scenario_naming_mismatch_warns_and_still_generates() {
        let dir = tempfile::tempdir().unwrap();
        let naming = NamingConvention::new(r"^(.+)(?:Request|Response)$", PartnerNameSource::Subclass).unwrap();
        let model = DeclarationModel::from_declarations([
            tagged("", "FooCommand", "request", Some("Base")),
            Declaration::new("", "FooCommandResponse"),
        ]);
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()).with_naming(naming));

        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("naming convention"));
        assert_eq!(report.generated.len(), 1);
        assert!(seen[0].1.get("partnerClass").is_none());
    }

    #[test]
    fn untagged_declarations_have_no_effects() {
        let model = DeclarationModel::from_declarations([
            Declaration::new("p", "Plain").with_superclass("Base"),
            Declaration::new("p", "FooRequest").with_tag(Tag::new("author")),
        ]);
        let capture = Capture::default();
        let mut generator = Generator::new(&model, &capture, GeneratorConfig::new("unused"));
        let mut diagnostics = Vec::new();
        for decl in &model {
            assert!(generator.plan(decl, &mut diagnostics).is_none());
        }
        assert!(diagnostics.is_empty());
        assert_eq!(generator.lookups(), 0);
    }

    #[test]
    fn missing_partner_still_generates() {
        let model = DeclarationModel::from_declarations([
            tagged("p", "FooRequest", "request", Some("BarReq")),
            abstract_request(),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));
        assert_eq!(report.generated.len(), 1);
        assert!(report.diagnostics.is_empty());
        let attrs = &seen[0].1;
        assert!(attrs.get("partnerClass").is_none());
        assert_eq!(attrs["superclassConstructors"][0]["args"][0]["type"], "R");
    }

    #[test]
    fn tag_superclass_override_selects_base_constructors() {
        let model = DeclarationModel::from_declarations([
            Declaration::new("p", "FooResponse")
                .with_superclass("BarResp")
                .with_tag(Tag::new("response").with_param("superclass", "com.rpc.CustomResponse<T>")),
            Declaration::new("p", "FooRequest"),
            Declaration::new("com.rpc", "CustomResponse").with_constructor(Constructor::new(
                "CustomResponse",
                vec![Param::new(TypeRef::unresolved("T"), "request")],
            )),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let (_, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));
        let attrs = &seen[0].1;
        assert_eq!(attrs["superClass"], "com.rpc.CustomResponse<T>");
        assert_eq!(attrs["partnerClass"], "FooRequest");
        assert_eq!(attrs["superclassConstructors"][0]["args"][0]["type"], "p.FooRequest");
    }

    #[test]
    fn own_constructors_keep_order_and_types() {
        let decl = tagged("p", "FooEvent", "event", Some("Bar"))
            .with_constructor(Constructor::new("FooEvent", vec![]))
            .with_constructor(Constructor::new("FooEvent", vec![
                Param::new(TypeRef::unresolved("T"), "a"),
                Param::new(TypeRef::resolved("int"), "b"),
            ]));
        let model = DeclarationModel::from_declarations([decl]);
        let dir = tempfile::tempdir().unwrap();
        let (_, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));
        let ctors = seen[0].1["constructors"].as_array().unwrap().clone();
        assert_eq!(ctors.len(), 2);
        assert_eq!(ctors[0]["args"].as_array().unwrap().len(), 0);
        // no partner fallback for the primary list
        assert_eq!(ctors[1]["args"][0]["type"], "T");
        assert_eq!(ctors[1]["args"][1]["name"], "b");
    }

    #[test]
    fn rejected_multi_tag_is_skipped() {
        let model = DeclarationModel::from_declarations([
            tagged("p", "OddRequest", "request", Some("Base")).with_tag(Tag::new("event")),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path()).with_multi_tag_policy(MultiTagPolicy::Reject);
        let (report, seen) = run_captured(&model, config);
        assert!(seen.is_empty());
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped[0].tag, Variant::Event);
        assert!(skipped[0].message.contains("more than one variant tag"));
    }

    #[test]
    fn extra_variant_tags_are_reported_as_warnings() {
        let model = DeclarationModel::from_declarations([
            tagged("p", "OddRequest", "request", Some("Base")).with_tag(Tag::new("event")),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));
        assert_eq!(report.generated.len(), 1);
        assert_eq!(seen[0].0, "event");
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].tag, Variant::Event);
        assert_eq!(warnings[0].declaration, "p.OddRequest");
        assert!(warnings[0].message.contains("also tagged request"));
    }

    #[test]
    fn default_convention_rejects_dotted_names() {
        let model = DeclarationModel::from_declarations([
            tagged("p", "Outer.FooRequest", "request", Some("BarReq")),
            Declaration::new("p", "FooResponse"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let (report, seen) = run_captured(&model, GeneratorConfig::new(dir.path()));
        assert_eq!(report.generated.len(), 1);
        assert_eq!(report.generated[0].path, dir.path().join("p/BarReq.java"));
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("`Outer.FooRequest` does not follow"));
        assert!(seen[0].1.get("partnerClass").is_none());
    }

    #[test]
    fn writes_under_package_path_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("com/example/Bar.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale content that is much longer than the template output").unwrap();

        let model = DeclarationModel::from_declarations([tagged("com.example", "FooEvent", "event", Some("Bar"))]);
        let templates = Templates::from_sources([(Variant::Event, "class {{className}}")]).unwrap();
        let config = GeneratorConfig::new(dir.path()).with_extension(".txt");
        let report = Generator::new(&model, templates, config).run().unwrap();

        assert_eq!(report.generated[0].path, stale);
        assert_eq!(fs::read_to_string(&stale).unwrap(), "class Bar");
        assert_eq!(report.source_root, dir.path());
    }

    #[test]
    fn same_output_path_twice_warns() {
        let dir = tempfile::tempdir().unwrap();
        let model = DeclarationModel::from_declarations([
            tagged("p", "AEvent", "event", Some("Shared")),
            tagged("p", "BEvent", "event", Some("Shared")),
        ]);
        let (report, _) = run_captured(&model, GeneratorConfig::new(dir.path()));
        assert_eq!(report.generated.len(), 2);
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].declaration, "p.BEvent");
        assert!(warnings[0].message.contains("p.AEvent"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen");
        let model = DeclarationModel::from_declarations([tagged("p", "FooEvent", "event", Some("Bar"))]);
        let config = GeneratorConfig::new(&out).with_dry_run(true);
        let report = Generator::new(&model, Templates::embedded().unwrap(), config).run().unwrap();
        assert_eq!(report.generated[0].path, out.join("p/Bar.java"));
        assert!(!out.exists());
    }

    #[test]
    fn write_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("p");
        fs::write(&blocker, "a file where a directory should be").unwrap();
        let model = DeclarationModel::from_declarations([tagged("p", "FooEvent", "event", Some("Bar"))]);
        let result = Generator::new(&model, Templates::embedded().unwrap(), GeneratorConfig::new(dir.path())).run();
        assert!(matches!(result, Err(GenError::Write { .. })));
    }

    #[test]
    fn diagnostics_display_tag_and_declaration() {
        let d = Diagnostic {
            level: Level::Error,
            tag: Variant::Request,
            declaration: "app.LostRequest".into(),
            message: "could not generate; no superclass specified".into(),
        };
        assert_eq!(d.to_string(), "error: @request app.LostRequest: could not generate; no superclass specified");
    }
}
