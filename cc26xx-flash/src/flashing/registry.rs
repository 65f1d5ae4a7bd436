use std::path::Path;

use cc26xx_target::{
    Family, LayoutMismatch, RawHelperAlgorithm, TargetDescription, TargetDescriptionSource,
};
use thiserror::Error;

/// Errors while loading helper algorithm descriptions.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The description file could not be read.
    #[error("The target description could not be read")]
    Io(#[from] std::io::Error),
    /// The description is not valid YAML for the schema.
    #[error("The target description could not be parsed")]
    Yaml(#[from] serde_yaml::Error),
    #[error("The helper algorithm '{name}' does not fit the {family} layout")]
    /// A helper is linked for a different address than its family needs.
    InvalidAlgorithm {
        /// Name of the helper.
        name: String,
        /// Family the helper is declared for.
        family: Family,
        /// What does not fit.
        #[source]
        source: LayoutMismatch,
    },
    /// A family would end up with two helpers.
    #[error("A helper algorithm for the {0} family is already registered")]
    DuplicateFamily(Family),
}

#[derive(Debug, Clone)]
struct RegisteredAlgorithm {
    algorithm: RawHelperAlgorithm,
    source: TargetDescriptionSource,
}

/// The helper algorithm images available to a flash bank, at most one per family.
///
/// ```no_run
/// use cc26xx_flash::flashing::AlgorithmRegistry;
///
/// let mut registry = AlgorithmRegistry::new();
/// registry.add_from_file("targets/cc26xx.yaml")?;
/// # Ok::<(), cc26xx_flash::flashing::RegistryError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: Vec<RegisteredAlgorithm>,
}

impl AlgorithmRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single helper algorithm.
    ///
    /// The description has to match the fixed layout of its family.
    pub fn add_algorithm(
        &mut self,
        algorithm: RawHelperAlgorithm,
        source: TargetDescriptionSource,
    ) -> Result<(), RegistryError> {
        self.check(&algorithm)?;
        self.push(algorithm, source);

        Ok(())
    }

    /// Register all helper algorithms of a YAML target description.
    ///
    /// The description is added as a whole or not at all. Returns the number
    /// of algorithms added.
    pub fn add_from_yaml(&mut self, yaml: &str) -> Result<usize, RegistryError> {
        let description: TargetDescription = serde_yaml::from_str(yaml)?;
        tracing::debug!("Loading target description '{}'", description.name);

        for (index, algorithm) in description.algorithms.iter().enumerate() {
            self.check(algorithm)?;

            if description.algorithms[..index]
                .iter()
                .any(|earlier| earlier.family == algorithm.family)
            {
                return Err(RegistryError::DuplicateFamily(algorithm.family));
            }
        }

        let count = description.algorithms.len();
        for algorithm in description.algorithms {
            self.push(algorithm, TargetDescriptionSource::External);
        }

        Ok(count)
    }

    fn check(&self, algorithm: &RawHelperAlgorithm) -> Result<(), RegistryError> {
        algorithm
            .check_layout()
            .map_err(|source| RegistryError::InvalidAlgorithm {
                name: algorithm.name.clone(),
                family: algorithm.family,
                source,
            })?;

        if self.get(algorithm.family).is_some() {
            return Err(RegistryError::DuplicateFamily(algorithm.family));
        }

        Ok(())
    }

    fn push(&mut self, algorithm: RawHelperAlgorithm, source: TargetDescriptionSource) {
        tracing::debug!(
            "Registered {} helper '{}' ({} bytes, {:?})",
            algorithm.family,
            algorithm.name,
            algorithm.instructions.len(),
            source
        );
        self.algorithms.push(RegisteredAlgorithm { algorithm, source });
    }

    /// Register all helper algorithms of a YAML target description file.
    pub fn add_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let yaml = std::fs::read_to_string(path)?;
        self.add_from_yaml(&yaml)
    }

    /// The helper algorithm for `family`, if one is registered.
    pub fn get(&self, family: Family) -> Option<&RawHelperAlgorithm> {
        self.algorithms
            .iter()
            .find(|entry| entry.algorithm.family == family)
            .map(|entry| &entry.algorithm)
    }

    /// Where the helper algorithm for `family` came from.
    pub fn source(&self, family: Family) -> Option<&TargetDescriptionSource> {
        self.algorithms
            .iter()
            .find(|entry| entry.algorithm.family == family)
            .map(|entry| &entry.source)
    }
}
