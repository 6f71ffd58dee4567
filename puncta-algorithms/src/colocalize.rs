//! Centroid-containment colocalization of foci and nuclei.

use puncta_core::{NucleusRecord, Population};

/// Partitions a foci population by nucleus using centroid containment.
///
/// Each focus is assigned to the first nucleus (in population order)
/// whose voxel mask contains the focus's rounded centroid; a focus
/// contained by no nucleus is discarded. Returns one record per
/// nucleus in population order, each with its matched foci relabeled
/// densely within the record.
///
/// Precondition: nucleus masks come from instance segmentation and do
/// not overlap; with overlapping masks the first match silently wins.
pub fn colocalize(nuclei: &Population, foci: &Population) -> Vec<NucleusRecord> {
    let mut matched: Vec<Vec<_>> = vec![Vec::new(); nuclei.len()];

    for focus in foci.iter() {
        let centroid = focus.centroid_voxel();
        if let Some(i) = nuclei.iter().position(|nuc| nuc.contains(centroid)) {
            matched[i].push(focus.clone());
        }
    }

    nuclei
        .iter()
        .zip(matched)
        .map(|(nucleus, foci_in)| {
            NucleusRecord::new(nucleus.clone(), Population::from_objects(foci_in))
        })
        .collect()
}
