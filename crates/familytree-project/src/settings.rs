use crate::error::SettingsError;
use familytree_core::{CollapsePolicy, LayoutDirection};
use familytree_graph::{HierarchyBuilder, LayoutConfig, TreeBehavior, Vec2, Viewport};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Viewer configuration. Every field has a default, so a partial file is
/// valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub initial_collapse: CollapsePolicy,
    pub collapse_children_on_expand: bool,
    /// Fail on unresolvable child ids instead of dropping them.
    pub strict_hierarchy: bool,
    pub min_search_len: usize,
    /// 0 searches on every keystroke.
    pub search_debounce_ms: u64,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub horizontal_inset: f32,
    pub vertical_inset: f32,
    pub top_offset: f32,
    pub direction: LayoutDirection,
    pub node_radius: f32,
    pub transition_ms: u64,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            initial_collapse: CollapsePolicy::RootExpanded,
            collapse_children_on_expand: false,
            strict_hierarchy: false,
            min_search_len: 2,
            search_debounce_ms: 0,
            viewport_width: 1200.0,
            viewport_height: 800.0,
            horizontal_inset: LayoutConfig::HORIZONTAL_INSET,
            vertical_inset: LayoutConfig::VERTICAL_INSET,
            top_offset: LayoutConfig::DEPTH_OFFSET,
            direction: LayoutDirection::Vertical,
            node_radius: 15.0,
            transition_ms: 200,
            min_zoom: Viewport::MIN_ZOOM,
            max_zoom: Viewport::MAX_ZOOM,
        }
    }
}

impl ViewerSettings {
    const APP_DIR: &'static str = "familytree";
    const FILE_NAME: &'static str = "settings.json";

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Load from `path`, or the platform config dir when `None`. Any
    /// problem is logged and yields the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                tracing::warn!("No config directory, using default settings");
                return Self::default();
            }
        };
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }
        match Self::read(&path) {
            Ok(settings) => {
                tracing::info!("Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write pretty JSON to `path`, or the platform config dir when `None`.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, SettingsError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or(SettingsError::NoConfigDir)?;
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(io_err)?;
        Ok(path)
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig::with_insets(
            self.viewport_width,
            self.viewport_height,
            (self.horizontal_inset, self.vertical_inset),
            self.top_offset,
            self.direction,
        )
    }

    pub fn tree_behavior(&self) -> TreeBehavior {
        TreeBehavior {
            collapse_children_on_expand: self.collapse_children_on_expand,
        }
    }

    pub fn hierarchy_builder(&self) -> HierarchyBuilder {
        HierarchyBuilder::new().strict(self.strict_hierarchy)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            Vec2::new(self.viewport_width, self.viewport_height),
            self.min_zoom,
            self.max_zoom,
        )
    }
}
