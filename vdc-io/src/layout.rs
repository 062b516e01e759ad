use vdc_metadata::VdcType;

/// File-naming convention of §6: VDC-2 names each `(level, LOD)` pair
/// separately; VDC-1 has no LOD axis in its name since `L == 1` is implied
/// by the type.
pub fn brick_file_name(var: &str, t: usize, level: usize, lod: usize, vdc_type: VdcType) -> String {
    match vdc_type {
        VdcType::Type1 => format!("{}.ts{:05}.wb{}", var, t, level),
        VdcType::Type2 => format!("{}.ts{:05}.{}.{}", var, t, level, lod),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type1_name_has_no_lod_suffix() {
        let name = brick_file_name("u", 3, 2, 0, VdcType::Type1);
        assert_eq!(name, "u.ts00003.wb2");
    }

    #[test]
    fn type2_name_includes_level_and_lod() {
        let name = brick_file_name("u", 3, 2, 1, VdcType::Type2);
        assert_eq!(name, "u.ts00003.2.1");
    }
}
