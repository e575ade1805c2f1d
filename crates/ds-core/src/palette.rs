//! Block palette shared by the catalog producer and the matcher.
//!
//! The numeric codes are part of the room blob wire format: code `n` is
//! `PALETTE[n - 1]`, code 0 means the block is not in the palette. Never
//! reorder or remove entries; append only, and bump
//! [`crate::codec::FORMAT_VERSION`] when doing so.

/// Code for blocks outside the palette (and for unobserved sample cells)
pub const UNMAPPED: u8 = 0;

/// Block identifiers in code order, starting at code 1
pub const PALETTE: [&str; 21] = [
    "minecraft:stone",
    "minecraft:diorite",
    "minecraft:polished_diorite",
    "minecraft:andesite",
    "minecraft:polished_andesite",
    "minecraft:grass_block",
    "minecraft:dirt",
    "minecraft:coarse_dirt",
    "minecraft:cobblestone",
    "minecraft:bedrock",
    "minecraft:oak_leaves",
    "minecraft:gray_wool",
    "minecraft:double_stone_slab",
    "minecraft:mossy_cobblestone",
    "minecraft:clay",
    "minecraft:stone_bricks",
    "minecraft:mossy_stone_bricks",
    "minecraft:chiseled_stone_bricks",
    "minecraft:gray_terracotta",
    "minecraft:cyan_terracotta",
    "minecraft:black_terracotta",
];

/// Highest valid code
pub const MAX_CODE: u8 = PALETTE.len() as u8;

/// Look up the code of a block identifier, [`UNMAPPED`] if absent.
pub fn code_of(identifier: &str) -> u8 {
    PALETTE
        .iter()
        .position(|id| *id == identifier)
        .map(|i| (i + 1) as u8)
        .unwrap_or(UNMAPPED)
}

/// Block identifier for a code, `None` for [`UNMAPPED`] or out-of-range codes.
pub fn identifier_of(code: u8) -> Option<&'static str> {
    if code == UNMAPPED {
        return None;
    }
    PALETTE.get(code as usize - 1).copied()
}

/// Whether a code may appear in a room blob
pub fn is_valid_code(code: u8) -> bool {
    code <= MAX_CODE
}
