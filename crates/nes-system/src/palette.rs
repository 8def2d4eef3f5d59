//! The fixed 2C02 master palette.

/// 64-entry master palette as ARGB32.
///
/// The 2C02 generates composite video directly; these values are the
/// canonical RGB decode of its 64 colour codes. Columns $0D-$0F of each row
/// are blacks ($0D is "blacker than black" on real hardware and is rendered
/// plain black here).
#[rustfmt::skip]
pub const PALETTE: [u32; 64] = [
    0xFF54_5454, 0xFF00_1E74, 0xFF08_1090, 0xFF30_0088,
    0xFF44_0064, 0xFF5C_0030, 0xFF54_0400, 0xFF3C_1800,
    0xFF20_2A00, 0xFF08_3A00, 0xFF00_4000, 0xFF00_3C00,
    0xFF00_323C, 0xFF00_0000, 0xFF00_0000, 0xFF00_0000,
    0xFF98_9698, 0xFF08_4CC4, 0xFF30_32EC, 0xFF5C_1EE4,
    0xFF88_14B0, 0xFFA0_1464, 0xFF98_2220, 0xFF78_3C00,
    0xFF54_5A00, 0xFF28_7200, 0xFF08_7C00, 0xFF00_7628,
    0xFF00_6678, 0xFF00_0000, 0xFF00_0000, 0xFF00_0000,
    0xFFEC_EEEC, 0xFF4C_9AEC, 0xFF78_7CEC, 0xFFB0_62EC,
    0xFFE4_54EC, 0xFFEC_58B4, 0xFFEC_6A64, 0xFFD4_8820,
    0xFFA0_AA00, 0xFF74_C400, 0xFF4C_D020, 0xFF38_CC6C,
    0xFF38_B4CC, 0xFF3C_3C3C, 0xFF00_0000, 0xFF00_0000,
    0xFFEC_EEEC, 0xFFA8_CCEC, 0xFFBC_BCEC, 0xFFD4_B2EC,
    0xFFEC_AEEC, 0xFFEC_AED4, 0xFFEC_B4B0, 0xFFE4_C490,
    0xFFCC_D278, 0xFFB4_DE78, 0xFFA8_E290, 0xFF98_E2B4,
    0xFFA0_D6E4, 0xFFA0_A2A0, 0xFF00_0000, 0xFF00_0000,
];
