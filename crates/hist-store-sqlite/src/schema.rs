//! The fixed queries run against a places database.
//!
//! `moz_places` holds one row per page; `moz_historyvisits` holds one row per
//! visit and references its page through `place_id`.

/// Validation probe. Fails unless the store carries the `moz_meta` table.
pub const PROBE: &str = "SELECT * FROM moz_meta";

/// One row per visit event.
pub const VISITS: &str = "
SELECT P.url, P.id AS pid, V.id AS vid, V.visit_date, V.visit_type
FROM moz_historyvisits AS V, moz_places AS P
WHERE V.place_id = P.id
";

/// Pages that carry at least one piece of metadata.
pub const SITE_METADATA: &str = "
SELECT P.id AS pid, P.title, P.description, P.preview_image_url
FROM moz_places AS P
WHERE P.title IS NOT NULL
   OR P.description IS NOT NULL
   OR P.preview_image_url IS NOT NULL
";

/// Visits joined with their page metadata in the store itself.
pub const COMBINED: &str = "
SELECT P.url, V.visit_date, V.visit_type,
       P.title, P.description, P.preview_image_url
FROM moz_historyvisits AS V, moz_places AS P
WHERE V.place_id = P.id
";
