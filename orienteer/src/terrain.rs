use std::fmt::Display;

use image::{Rgb, Rgba};
use serde::{Deserialize, Serialize};

/// A terrain color packed as 0xAARRGGBB.
///
/// Alpha takes part in comparisons, so a translucent pixel never matches an
/// opaque palette color.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TerrainColor(pub u32);

impl TerrainColor {
    /// An opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, u8::MAX)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn channels(self) -> [u8; 3] {
        [(self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8]
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl From<Rgba<u8>> for TerrainColor {
    fn from(p: Rgba<u8>) -> Self {
        Self::rgba(p.0[0], p.0[1], p.0[2], p.0[3])
    }
}

impl From<Rgb<u8>> for TerrainColor {
    fn from(p: Rgb<u8>) -> Self {
        Self::rgb(p.0[0], p.0[1], p.0[2])
    }
}

impl Display for TerrainColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.channels();
        match self.alpha() {
            u8::MAX => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            a => write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a),
        }
    }
}

/// The terrain categories of an orienteering map
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TerrainClass {
    OpenLand,
    RoughMeadow,
    EasyMovementForest,
    SlowRunForest,
    WalkForest,
    ImpassibleVegetation,
    LakeSwampMarsh,
    PavedRoad,
    FootPath,
    OutOfBounds,
}

impl TerrainClass {
    /// The primary palette color of this class
    pub const fn color(self) -> TerrainColor {
        match self {
            TerrainClass::OpenLand => TerrainColor::rgb(248, 148, 18),
            TerrainClass::RoughMeadow => TerrainColor::rgb(255, 192, 0),
            TerrainClass::EasyMovementForest => TerrainColor::rgb(255, 255, 255),
            TerrainClass::SlowRunForest => TerrainColor::rgb(2, 208, 60),
            TerrainClass::WalkForest => TerrainColor::rgb(2, 136, 40),
            TerrainClass::ImpassibleVegetation => TerrainColor::rgb(5, 73, 24),
            TerrainClass::LakeSwampMarsh => TerrainColor::rgb(0, 0, 255),
            TerrainClass::PavedRoad => TerrainColor::rgb(71, 51, 3),
            TerrainClass::FootPath => TerrainColor::rgb(0, 0, 0),
            TerrainClass::OutOfBounds => TerrainColor::rgb(205, 0, 101),
        }
    }
}

/// Outcome of looking a color up in the palette
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PaletteEntry {
    pub color: TerrainColor,
    pub class: TerrainClass,
    pub walkable: bool,
}

const fn entry(class: TerrainClass, color: TerrainColor, walkable: bool) -> PaletteEntry {
    PaletteEntry {
        color,
        class,
        walkable,
    }
}

/// Maps each of the known terrain colors to its class and walkability.
///
/// Out of bounds carries two codes: the magenta map border, which blocks
/// movement, and the route marker color, which does not. The latter lets an
/// annotated map be fed back in as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainPalette {
    entries: [PaletteEntry; 11],
}

impl Default for TerrainPalette {
    fn default() -> Self {
        use TerrainClass::*;
        Self {
            entries: [
                entry(OpenLand, OpenLand.color(), true),
                entry(RoughMeadow, RoughMeadow.color(), true),
                entry(EasyMovementForest, EasyMovementForest.color(), true),
                entry(SlowRunForest, SlowRunForest.color(), true),
                entry(WalkForest, WalkForest.color(), true),
                entry(ImpassibleVegetation, ImpassibleVegetation.color(), false),
                entry(LakeSwampMarsh, LakeSwampMarsh.color(), true),
                entry(PavedRoad, PavedRoad.color(), true),
                entry(FootPath, FootPath.color(), true),
                entry(OutOfBounds, OutOfBounds.color(), false),
                entry(OutOfBounds, TerrainColor::rgb(200, 100, 230), true),
            ],
        }
    }
}

impl TerrainPalette {
    /// Look the color up, `None` if it is not one of the known codes
    pub fn classify(&self, color: TerrainColor) -> Option<PaletteEntry> {
        self.entries.iter().find(|e| e.color == color).copied()
    }

    pub fn is_walkable(&self, color: TerrainColor) -> Option<bool> {
        self.classify(color).map(|e| e.walkable)
    }

    /// Raw comparison against the lake code, never fails
    pub fn is_water(&self, color: TerrainColor) -> bool {
        color == TerrainClass::LakeSwampMarsh.color()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }
}
