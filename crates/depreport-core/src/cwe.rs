//! Weakness classification against fixed CWE reference sets.

use std::collections::HashSet;
use std::sync::OnceLock;

use crate::types::Alert;

/// CISA's 2023 Top 10 Known Exploited Vulnerabilities weaknesses.
pub const CWE_CISA_KEV_2023: &[&str] = &[
    "CWE-416", "CWE-122", "CWE-787", "CWE-20", "CWE-78", "CWE-502", "CWE-918", "CWE-843",
    "CWE-22", "CWE-306",
];

/// CWEs mapped to the OWASP Top 10 (2021) categories.
pub const CWE_OWASP_2021: &[&str] = &[
    "CWE-100", "CWE-1004", "CWE-1021", "CWE-1032", "CWE-1035", "CWE-11", "CWE-1104",
    "CWE-113", "CWE-116", "CWE-117", "CWE-1173", "CWE-1174", "CWE-1216", "CWE-1275",
    "CWE-13", "CWE-138", "CWE-15", "CWE-16", "CWE-183", "CWE-184", "CWE-2",
    "CWE-20", "CWE-200", "CWE-201", "CWE-209", "CWE-213", "CWE-219", "CWE-22",
    "CWE-223", "CWE-23", "CWE-235", "CWE-255", "CWE-256", "CWE-257", "CWE-259",
    "CWE-260", "CWE-261", "CWE-264", "CWE-266", "CWE-269", "CWE-275", "CWE-276",
    "CWE-280", "CWE-284", "CWE-285", "CWE-287", "CWE-288", "CWE-290", "CWE-294",
    "CWE-295", "CWE-296", "CWE-297", "CWE-300", "CWE-302", "CWE-304", "CWE-306",
    "CWE-307", "CWE-310", "CWE-311", "CWE-312", "CWE-313", "CWE-315", "CWE-316",
    "CWE-319", "CWE-321", "CWE-322", "CWE-323", "CWE-324", "CWE-325", "CWE-326",
    "CWE-327", "CWE-328", "CWE-329", "CWE-330", "CWE-331", "CWE-335", "CWE-336",
    "CWE-337", "CWE-338", "CWE-340", "CWE-345", "CWE-346", "CWE-347", "CWE-35",
    "CWE-352", "CWE-353", "CWE-359", "CWE-377", "CWE-384", "CWE-402", "CWE-419",
    "CWE-425", "CWE-426", "CWE-430", "CWE-434", "CWE-441", "CWE-444", "CWE-451",
    "CWE-470", "CWE-471", "CWE-472", "CWE-494", "CWE-497", "CWE-501", "CWE-502",
    "CWE-520", "CWE-521", "CWE-522", "CWE-523", "CWE-525", "CWE-526", "CWE-532",
    "CWE-537", "CWE-538", "CWE-539", "CWE-540", "CWE-541", "CWE-547", "CWE-548",
    "CWE-552", "CWE-564", "CWE-565", "CWE-566", "CWE-579", "CWE-59", "CWE-598",
    "CWE-601", "CWE-602", "CWE-610", "CWE-611", "CWE-613", "CWE-614", "CWE-620",
    "CWE-639", "CWE-640", "CWE-642", "CWE-643", "CWE-644", "CWE-646", "CWE-650",
    "CWE-651", "CWE-652", "CWE-653", "CWE-656", "CWE-657", "CWE-668", "CWE-706",
    "CWE-720", "CWE-73", "CWE-74", "CWE-75", "CWE-756", "CWE-757", "CWE-759",
    "CWE-760", "CWE-77", "CWE-776", "CWE-778", "CWE-78", "CWE-780", "CWE-784",
    "CWE-79", "CWE-798", "CWE-799", "CWE-80", "CWE-807", "CWE-818", "CWE-829",
    "CWE-83", "CWE-830", "CWE-840", "CWE-841", "CWE-862", "CWE-863", "CWE-87",
    "CWE-88", "CWE-89", "CWE-90", "CWE-91", "CWE-913", "CWE-915", "CWE-916",
    "CWE-917", "CWE-918", "CWE-922", "CWE-927", "CWE-93", "CWE-937", "CWE-94",
    "CWE-940", "CWE-942", "CWE-95", "CWE-96", "CWE-97", "CWE-98", "CWE-99",
];

fn cisa_kev() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| CWE_CISA_KEV_2023.iter().copied().collect())
}

fn owasp() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| CWE_OWASP_2021.iter().copied().collect())
}

/// True iff any CWE of the alert's advisory is in `set` (compared upper-cased).
fn has_cwe_in(alert: &Alert, set: &HashSet<&'static str>) -> bool {
    alert
        .cwe_ids()
        .any(|id| set.contains(id.to_uppercase().as_str()))
}

/// Does the alert reference a weakness from the CISA KEV top list?
pub fn has_cisa_cwe(alert: &Alert) -> bool {
    has_cwe_in(alert, cisa_kev())
}

/// Does the alert reference a weakness mapped to the OWASP Top 10?
pub fn has_owasp_cwe(alert: &Alert) -> bool {
    has_cwe_in(alert, owasp())
}
