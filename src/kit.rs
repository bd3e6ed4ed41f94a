//! The `Kit` data model (§3).
//!
//! The source represents a kit as an open property bag; we model it as a
//! tagged variant instead (§9 Design Notes) while preserving the on-disk
//! JSON shape through a custom `Serialize`/`Deserialize` pair, so a kits
//! document written by this crate looks exactly like one written by the
//! system it's compatible with.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `{ name, toolset?, platform? }` advising the build-generator driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredGenerator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// The part of a kit every variant shares.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KitHeader {
    pub preferred_generator: Option<PreferredGenerator>,
    pub cmake_settings: Option<BTreeMap<String, String>>,
    pub environment_variables: Option<BTreeMap<String, String>>,
    pub keep: Option<bool>,
}

/// A kit built around one or more language-tagged compiler drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerKit {
    pub name: String,
    pub compilers: BTreeMap<String, PathBuf>,
    pub header: KitHeader,
}

/// A kit built around a vendor (Visual Studio-family) installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorKit {
    pub name: String,
    pub visual_studio: String,
    pub visual_studio_architecture: String,
    /// clang-cl kits additionally carry `compilers`; plain vendor kits don't.
    pub compilers: Option<BTreeMap<String, PathBuf>>,
    pub header: KitHeader,
}

/// A kit built purely around an explicit CMake toolchain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainKit {
    pub name: String,
    pub toolchain_file: PathBuf,
    pub header: KitHeader,
}

/// The central record (§3). At least one of `Compiler`, `Vendor`, or
/// `Toolchain`'s identifying field must be present — enforced by
/// construction, since each variant carries exactly one kind of identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kit {
    Compiler(CompilerKit),
    Vendor(VendorKit),
    Toolchain(ToolchainKit),
}

impl Kit {
    pub fn name(&self) -> &str {
        match self {
            Kit::Compiler(k) => &k.name,
            Kit::Vendor(k) => &k.name,
            Kit::Toolchain(k) => &k.name,
        }
    }

    pub fn header(&self) -> &KitHeader {
        match self {
            Kit::Compiler(k) => &k.header,
            Kit::Vendor(k) => &k.header,
            Kit::Toolchain(k) => &k.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut KitHeader {
        match self {
            Kit::Compiler(k) => &mut k.header,
            Kit::Vendor(k) => &mut k.header,
            Kit::Toolchain(k) => &mut k.header,
        }
    }

    pub fn keep(&self) -> bool {
        self.header().keep.unwrap_or(false)
    }

    /// `compilers`, present on `Compiler` kits and optionally on clang-cl
    /// `Vendor` kits.
    pub fn compilers(&self) -> Option<&BTreeMap<String, PathBuf>> {
        match self {
            Kit::Compiler(k) => Some(&k.compilers),
            Kit::Vendor(k) => k.compilers.as_ref(),
            Kit::Toolchain(_) => None,
        }
    }

    /// The material tuple used by `change_needs_clean` (§4.G): compilers,
    /// vendor identity/architecture, toolchain file, and generator name.
    pub fn material_tuple(&self) -> MaterialTuple {
        MaterialTuple {
            compilers: self.compilers().cloned(),
            visual_studio: match self {
                Kit::Vendor(k) => Some(k.visual_studio.clone()),
                _ => None,
            },
            visual_studio_architecture: match self {
                Kit::Vendor(k) => Some(k.visual_studio_architecture.clone()),
                _ => None,
            },
            toolchain_file: match self {
                Kit::Toolchain(k) => Some(k.toolchain_file.clone()),
                _ => None,
            },
            preferred_generator_name: self
                .header()
                .preferred_generator
                .as_ref()
                .map(|g| g.name.clone()),
        }
    }
}

/// §4.G's material tuple: `{ compilers, visualStudio,
/// visualStudioArchitecture, toolchainFile, preferredGenerator.name }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialTuple {
    pub compilers: Option<BTreeMap<String, PathBuf>>,
    pub visual_studio: Option<String>,
    pub visual_studio_architecture: Option<String>,
    pub toolchain_file: Option<PathBuf>,
    pub preferred_generator_name: Option<String>,
}

/// `change_needs_clean(new, old)` (§4.G): `None` for `old` means first
/// selection, which never requires cleanup.
pub fn change_needs_clean(new: &Kit, old: Option<&Kit>) -> bool {
    match old {
        None => false,
        Some(old) => new.material_tuple() != old.material_tuple(),
    }
}

// ---- on-disk JSON shape -----------------------------------------------
//
// Every variant flattens onto the same JSON object shape the upstream tool
// uses: a plain object with `name`, optional `compilers`, optional
// `visualStudio`/`visualStudioArchitecture`, optional `toolchainFile`, and
// the shared header fields. Which identifying field is present determines
// which variant we deserialize into.

impl Serialize for Kit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", self.name())?;
        if let Some(compilers) = self.compilers() {
            if !compilers.is_empty() {
                map.serialize_entry("compilers", compilers)?;
            }
        }
        if let Kit::Vendor(k) = self {
            map.serialize_entry("visualStudio", &k.visual_studio)?;
            map.serialize_entry(
                "visualStudioArchitecture",
                &k.visual_studio_architecture,
            )?;
        }
        if let Kit::Toolchain(k) = self {
            map.serialize_entry("toolchainFile", &k.toolchain_file)?;
        }
        let header = self.header();
        if let Some(pg) = &header.preferred_generator {
            map.serialize_entry("preferredGenerator", pg)?;
        }
        if let Some(cs) = &header.cmake_settings {
            map.serialize_entry("cmakeSettings", cs)?;
        }
        if let Some(ev) = &header.environment_variables {
            map.serialize_entry("environmentVariables", ev)?;
        }
        if let Some(keep) = header.keep {
            map.serialize_entry("keep", &keep)?;
        }
        map.end()
    }
}

#[derive(Default)]
struct RawKit {
    name: Option<String>,
    compilers: Option<BTreeMap<String, PathBuf>>,
    visual_studio: Option<String>,
    visual_studio_architecture: Option<String>,
    toolchain_file: Option<PathBuf>,
    preferred_generator: Option<PreferredGenerator>,
    cmake_settings: Option<BTreeMap<String, String>>,
    environment_variables: Option<BTreeMap<String, String>>,
    keep: Option<bool>,
}

impl<'de> Deserialize<'de> for Kit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KitVisitor;

        impl<'de> Visitor<'de> for KitVisitor {
            type Value = Kit;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a kit object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Kit, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut raw = RawKit::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "name" => raw.name = Some(map.next_value()?),
                        "compilers" => raw.compilers = Some(map.next_value()?),
                        "visualStudio" => raw.visual_studio = Some(map.next_value()?),
                        "visualStudioArchitecture" => {
                            raw.visual_studio_architecture = Some(map.next_value()?)
                        }
                        "toolchainFile" => raw.toolchain_file = Some(map.next_value()?),
                        "preferredGenerator" => {
                            raw.preferred_generator = Some(map.next_value()?)
                        }
                        "cmakeSettings" => raw.cmake_settings = Some(map.next_value()?),
                        "environmentVariables" => {
                            raw.environment_variables = Some(map.next_value()?)
                        }
                        "keep" => raw.keep = Some(map.next_value()?),
                        _ => {
                            let _: de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                let name = raw.name.ok_or_else(|| de::Error::missing_field("name"))?;
                let header = KitHeader {
                    preferred_generator: raw.preferred_generator,
                    cmake_settings: raw.cmake_settings,
                    environment_variables: raw.environment_variables,
                    keep: raw.keep,
                };
                if let Some(vs) = raw.visual_studio {
                    let arch = raw.visual_studio_architecture.ok_or_else(|| {
                        de::Error::custom(
                            "visualStudioArchitecture is required when visualStudio is set",
                        )
                    })?;
                    return Ok(Kit::Vendor(VendorKit {
                        name,
                        visual_studio: vs,
                        visual_studio_architecture: arch,
                        compilers: raw.compilers,
                        header,
                    }));
                }
                if let Some(tf) = raw.toolchain_file {
                    return Ok(Kit::Toolchain(ToolchainKit {
                        name,
                        toolchain_file: tf,
                        header,
                    }));
                }
                let compilers = raw.compilers.ok_or_else(|| {
                    de::Error::custom(
                        "kit must have one of compilers, visualStudio, or toolchainFile",
                    )
                })?;
                Ok(Kit::Compiler(CompilerKit {
                    name,
                    compilers,
                    header,
                }))
            }
        }

        deserializer.deserialize_map(KitVisitor)
    }
}
