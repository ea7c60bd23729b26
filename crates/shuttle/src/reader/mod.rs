//! Building readers and falling back to the generic path.
//!
//! The synthesized reader is an optimization over a slower generic reader
//! that handles every message. [`MethodReader`] pairs the two: each message
//! the synthesized reader does not handle is rewound and handed to the
//! fallback, and when synthesis is unavailable altogether the fallback
//! handles every message.

use std::sync::Arc;

use shuttle_wire::{WireIn, WireType};
use tracing::{debug, info, warn};

use crate::artifact::{DISPATCH_TARGET, ReaderArtifact};
use crate::cache::{ReaderCache, ReaderKey};
use crate::config::SynthesisConfig;
use crate::error::BuildError;
use crate::intercept::Interception;
use crate::plan::{BUILD_TARGET, DispatchPlan};
use crate::target::{Target, TargetInstance};

/// Generic reader used for messages the synthesized reader does not handle.
pub trait FallbackReader {
    /// Reads and handles the next message from `wire` against `targets`.
    ///
    /// Returns `true` if the message was handled.
    fn read_one(&mut self, wire: &mut dyn WireIn, targets: &mut [TargetInstance]) -> bool;
}

/// Fallback that logs each message it is given and skips it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkippingFallback;

impl FallbackReader for SkippingFallback {
    fn read_one(&mut self, wire: &mut dyn WireIn, _targets: &mut [TargetInstance]) -> bool {
        let mut name = String::new();
        match wire.read_event(&mut name) {
            Ok(Some(event)) => {
                let skipped = wire.value_in().skip_value();
                debug!(
                    target: DISPATCH_TARGET,
                    ?event,
                    name,
                    skipped = skipped.is_ok(),
                    "message skipped by fallback reader"
                );
                false
            }
            Ok(None) => false,
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    %error,
                    "fallback reader could not read message header"
                );
                false
            }
        }
    }
}

enum Engine {
    Synthesized(ReaderArtifact),
    Fallback {
        targets: Vec<TargetInstance>,
        reason: BuildError,
    },
}

/// Reader combining a synthesized reader with a fallback.
pub struct MethodReader<F> {
    engine: Engine,
    fallback: F,
}

impl<F: FallbackReader> MethodReader<F> {
    /// Reads the next message, falling back to the generic reader when the
    /// synthesized one does not handle it.
    ///
    /// Returns `true` if either reader handled the message.
    pub fn read_one(&mut self, wire: &mut dyn WireIn) -> bool {
        match &mut self.engine {
            Engine::Synthesized(artifact) => {
                let start = wire.position();
                if artifact.read_one(wire) {
                    return true;
                }
                wire.rewind(start);
                self.fallback.read_one(wire, artifact.targets_mut())
            }
            Engine::Fallback { targets, .. } => self.fallback.read_one(wire, targets),
        }
    }

    /// Reads messages until the wire stops advancing.
    ///
    /// Returns the number of messages handled.
    pub fn read_all(&mut self, wire: &mut dyn WireIn) -> usize {
        let mut handled = 0_usize;
        loop {
            let before = wire.position();
            if self.read_one(wire) {
                handled = handled.saturating_add(1);
            }
            if wire.position() == before {
                return handled;
            }
        }
    }

    /// Returns `true` if messages go through the synthesized reader first.
    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        matches!(self.engine, Engine::Synthesized(_))
    }

    /// Returns the synthesized reader, if there is one.
    #[must_use]
    pub const fn artifact(&self) -> Option<&ReaderArtifact> {
        match &self.engine {
            Engine::Synthesized(artifact) => Some(artifact),
            Engine::Fallback { .. } => None,
        }
    }

    /// Returns why synthesis was unavailable.
    #[must_use]
    pub const fn fallback_reason(&self) -> Option<&BuildError> {
        match &self.engine {
            Engine::Synthesized(_) => None,
            Engine::Fallback { reason, .. } => Some(reason),
        }
    }

    /// Returns the fallback reader.
    #[must_use]
    pub const fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Borrows the first target of type `T`.
    #[must_use]
    pub fn target<T: Target>(&self) -> Option<&T> {
        match &self.engine {
            Engine::Synthesized(artifact) => artifact.target::<T>(),
            Engine::Fallback { targets, .. } => {
                targets.iter().find_map(TargetInstance::downcast_ref::<T>)
            }
        }
    }

    /// Releases the targets.
    #[must_use]
    pub fn into_targets(self) -> Vec<TargetInstance> {
        match self.engine {
            Engine::Synthesized(artifact) => artifact.into_targets(),
            Engine::Fallback { targets, .. } => targets,
        }
    }
}

impl<F> std::fmt::Debug for MethodReader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.engine {
            Engine::Synthesized(artifact) => f
                .debug_struct("MethodReader")
                .field("artifact", artifact)
                .finish_non_exhaustive(),
            Engine::Fallback { targets, reason } => f
                .debug_struct("MethodReader")
                .field("targets", targets)
                .field("reason", reason)
                .finish_non_exhaustive(),
        }
    }
}

/// Builds readers over a set of targets.
///
/// # Example
///
/// ```
/// use shuttle::{
///     ContractSpec, OperationSpec, Parameter, ReaderBuilder, ReaderCache, Target, TargetSpec,
/// };
/// use shuttle_wire::{JsonReader, WireType};
///
/// trait Greeter {
///     fn greet(&mut self, name: &str);
/// }
///
/// fn greeter_contract() -> ContractSpec<dyn Greeter> {
///     ContractSpec::new("Greeter").operation(
///         OperationSpec::<dyn Greeter>::new("greet", |greeter, args| {
///             greeter.greet(args.text(0)?);
///             Ok(())
///         })
///         .param(Parameter::text("name")),
///     )
/// }
///
/// #[derive(Default)]
/// struct Host {
///     greeted: Vec<String>,
/// }
///
/// impl Greeter for Host {
///     fn greet(&mut self, name: &str) {
///         self.greeted.push(name.to_owned());
///     }
/// }
///
/// impl Target for Host {
///     fn describe(spec: &mut TargetSpec<Self>) {
///         spec.implements(greeter_contract(), |host| host);
///     }
/// }
///
/// let mut reader = ReaderBuilder::new(WireType::Json)
///     .target(Host::default())
///     .cache(ReaderCache::new().into())
///     .build()
///     .expect("reader builds");
///
/// let mut wire = JsonReader::parse("{\"greet\":\"Ada\"}\n").expect("valid json");
/// assert!(reader.read_one(&mut wire));
/// assert_eq!(reader.target::<Host>().map(|host| host.greeted.len()), Some(1));
/// ```
#[derive(Debug)]
pub struct ReaderBuilder {
    wire_type: WireType,
    targets: Vec<TargetInstance>,
    interception: Interception,
    config: SynthesisConfig,
    cache: Arc<ReaderCache>,
}

impl ReaderBuilder {
    /// Starts a reader for `wire_type` on the process-wide cache.
    #[must_use]
    pub fn new(wire_type: WireType) -> Self {
        Self {
            wire_type,
            targets: Vec::new(),
            interception: Interception::None,
            config: SynthesisConfig::default(),
            cache: ReaderCache::shared(),
        }
    }

    /// Appends a target.
    #[must_use]
    pub fn target<T: Target>(mut self, target: T) -> Self {
        self.targets.push(TargetInstance::new(target));
        self
    }

    /// Appends already wrapped targets.
    #[must_use]
    pub fn targets(mut self, targets: impl IntoIterator<Item = TargetInstance>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Sets how calls are wrapped.
    #[must_use]
    pub fn interception(mut self, interception: Interception) -> Self {
        self.interception = interception;
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: SynthesisConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `cache` instead of the process-wide cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<ReaderCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Builds the synthesized reader.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the contracts are invalid or synthesis is
    /// unavailable.
    pub fn build(self) -> Result<ReaderArtifact, BuildError> {
        let plan = self.compile()?;
        Ok(ReaderArtifact::new(plan, self.targets, self.interception))
    }

    /// Builds a reader that falls back to `fallback`.
    ///
    /// Recoverable build errors are logged once and leave `fallback` to
    /// read every message.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] only when the error is fatal.
    pub fn build_reader<F: FallbackReader>(self, fallback: F) -> Result<MethodReader<F>, BuildError> {
        match self.compile() {
            Ok(plan) => Ok(MethodReader {
                engine: Engine::Synthesized(ReaderArtifact::new(
                    plan,
                    self.targets,
                    self.interception,
                )),
                fallback,
            }),
            Err(error) if error.is_fatal() => Err(error),
            Err(reason) => {
                warn!(
                    target: BUILD_TARGET,
                    wire_type = %self.wire_type,
                    %reason,
                    "reader synthesis unavailable, using the fallback reader"
                );
                Ok(MethodReader {
                    engine: Engine::Fallback {
                        targets: self.targets,
                        reason,
                    },
                    fallback,
                })
            }
        }
    }

    fn compile(&self) -> Result<Arc<DispatchPlan>, BuildError> {
        if self.targets.is_empty() {
            return Err(BuildError::NoTargets);
        }
        if !self.config.synthesis_enabled() {
            return Err(BuildError::SynthesisDisabled);
        }

        let key = ReaderKey::new(&self.targets, self.wire_type, &self.interception);
        let plan = self.cache.get_or_build(&key, || {
            let name = key.reader_name();
            info!(target: BUILD_TARGET, reader = %name, "synthesizing reader");
            DispatchPlan::compile(&self.targets, self.wire_type, name, self.config.dump_plan())
        })?;
        if plan.fits(&self.targets) {
            Ok(plan)
        } else {
            Err(BuildError::internal(format!(
                "cached plan {} does not fit its targets",
                plan.name()
            )))
        }
    }
}

/// Builds a synthesized reader on the process-wide cache.
///
/// # Errors
///
/// Returns [`BuildError::DuplicateOperation`] when two operations share a
/// name with different signatures, and other [`BuildError`]s when the
/// reader cannot be synthesized.
pub fn build(
    targets: Vec<TargetInstance>,
    wire_type: WireType,
    interception: Interception,
) -> Result<ReaderArtifact, BuildError> {
    ReaderBuilder::new(wire_type)
        .targets(targets)
        .interception(interception)
        .build()
}
