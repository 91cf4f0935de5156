mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use std::{cmp::Ordering, collections::HashSet};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct PersonId(usize);

// A person resolved against the active attributes.
// For each attribute, in order: the index of the selection and the flexibility.
#[derive(Eq, PartialEq, Debug, Clone)]
struct CheckedPerson {
    choices: Vec<(usize, u8)>,
}

// Symmetric table of the pair compatibility scores.
#[derive(PartialEq, Debug, Clone)]
struct PairTable {
    size: usize,
    scores: Vec<f64>,
}

impl PairTable {
    fn score(&self, p1: PersonId, p2: PersonId) -> f64 {
        self.scores[p1.0 * self.size + p2.0]
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct GroupInternal {
    members: Vec<PersonId>,
    capacity: usize,
}

impl GroupInternal {
    fn new(capacity: usize) -> GroupInternal {
        GroupInternal {
            members: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn room(&self) -> usize {
        self.capacity - self.members.len()
    }

    fn add_member(&mut self, pid: PersonId, people: &[Person]) -> Result<(), GroupingErrors> {
        if self.members.len() >= self.capacity {
            return Err(GroupingErrors::GroupFull);
        }
        if self.members.contains(&pid) {
            return Err(GroupingErrors::DuplicateMember {
                person: people[pid.0].name.clone(),
            });
        }
        self.members.push(pid);
        Ok(())
    }

    fn remove_member(&mut self, pid: PersonId, people: &[Person]) -> Result<(), GroupingErrors> {
        let idx = self
            .members
            .iter()
            .position(|m| *m == pid)
            .ok_or_else(|| GroupingErrors::NotAMember {
                person: people[pid.0].name.clone(),
            })?;
        self.members.remove(idx);
        Ok(())
    }

    // All the member pairs, in member order.
    fn pairs(&self, table: &PairTable) -> Vec<(PersonId, PersonId, f64)> {
        let mut res = Vec::new();
        for (idx, p1) in self.members.iter().enumerate() {
            for p2 in self.members[idx + 1..].iter() {
                res.push((*p1, *p2, table.score(*p1, *p2)));
            }
        }
        res
    }

    fn gcs(&self, table: &PairTable) -> Option<f64> {
        if self.members.len() < 2 {
            return None;
        }
        let scores: Vec<f64> = self.pairs(table).iter().map(|p| p.2).collect();
        Some(mean(&scores))
    }
}

/// Runs the grouping algorithm selected by the rules.
///
/// Arguments:
/// * `people` the cohort to split, in input order
/// * `attributes` the active attributes. Every person must have a selection for each of them.
/// * `rules` the strategy and the size constraints
pub fn run_grouping(
    people: &[Person],
    attributes: &[Attribute],
    rules: &GroupingRules,
) -> Result<GroupingResult, GroupingErrors> {
    info!(
        "Processing {:?} people, active attributes: {:?}, rules: {:?}",
        people.len(),
        attributes.iter().map(|a| a.name.clone()).collect::<Vec<_>>(),
        rules
    );
    rules.validate()?;
    if people.is_empty() {
        return Err(GroupingErrors::EmptyCohort);
    }

    let checked = checks(people, attributes)?;
    let table = compute_pair_table(&checked, attributes, rules.use_flexibility);
    debug!("run_grouping: pair table: {:?}", table);

    let groups = match rules.strategy {
        Strategy::Chunk => allocate_chunks(people.len(), rules.group_size as usize),
        Strategy::Preference => allocate_by_preference(people, rules.group_size as usize),
        Strategy::Greedy => allocate_greedy(
            people,
            &table,
            rules.min_group_size as usize,
            rules.max_group_size as usize,
        )?,
        Strategy::Annealing => {
            let initial = allocate_greedy(
                people,
                &table,
                rules.min_group_size as usize,
                rules.max_group_size as usize,
            )?;
            allocate_annealing(initial, people, &table, &rules.annealing, rules.seed)?
        }
    };

    let result = groups_to_result(&groups, people, &table);
    info!(
        "Formed {} groups, GCS mean: {:.4}, GCS variance: {:.4}",
        result.groups.len(),
        result.gcs_mean,
        result.gcs_variance
    );
    for g in result.groups.iter() {
        info!("{} ({} members): {:?}", g.name, g.members.len(), g.members);
    }
    Ok(result)
}

fn checks(people: &[Person], attributes: &[Attribute]) -> Result<Vec<CheckedPerson>, GroupingErrors> {
    let mut seen: HashSet<&str> = HashSet::new();
    for attr in attributes.iter() {
        if !seen.insert(attr.name.as_str()) {
            return Err(GroupingErrors::DuplicateAttribute {
                attribute: attr.name.clone(),
            });
        }
    }

    let mut res: Vec<CheckedPerson> = Vec::with_capacity(people.len());
    for p in people.iter() {
        let mut choices: Vec<(usize, u8)> = Vec::with_capacity(attributes.len());
        for attr in attributes.iter() {
            let selection =
                p.selection(&attr.name)
                    .ok_or_else(|| GroupingErrors::MissingSelection {
                        person: p.name.clone(),
                        attribute: attr.name.clone(),
                    })?;
            let idx = attr.checked_index(selection)?;
            let flexibility = p.flexibility_for(&attr.name);
            if !(1..=10).contains(&flexibility) {
                return Err(GroupingErrors::InvalidFlexibility {
                    person: p.name.clone(),
                    attribute: attr.name.clone(),
                    score: flexibility,
                });
            }
            choices.push((idx, flexibility));
        }
        res.push(CheckedPerson { choices });
    }
    debug!("checks: {} people checked", res.len());
    Ok(res)
}

// The weighted compatibility of two people over all the active attributes.
// The score for one attribute is damped by the larger flexibility of the two people.
fn pair_score(
    p1: &CheckedPerson,
    p2: &CheckedPerson,
    attributes: &[Attribute],
    use_flexibility: bool,
) -> f64 {
    let mut total = 0.0;
    for (attr, (&(s1, f1), &(s2, f2))) in attributes
        .iter()
        .zip(p1.choices.iter().zip(p2.choices.iter()))
    {
        let raw = attr.compatibility[s1][s2];
        let score = if use_flexibility {
            raw * (1.0 - (f1.max(f2) as f64) / 10.0)
        } else {
            raw
        };
        total += score * attr.weight;
    }
    if total > 0.0 {
        total
    } else {
        0.0
    }
}

fn compute_pair_table(
    checked: &[CheckedPerson],
    attributes: &[Attribute],
    use_flexibility: bool,
) -> PairTable {
    let size = checked.len();
    let mut scores = vec![0.0; size * size];
    for i in 0..size {
        for j in (i + 1)..size {
            let s = pair_score(&checked[i], &checked[j], attributes, use_flexibility);
            scores[i * size + j] = s;
            scores[j * size + i] = s;
        }
    }
    PairTable { size, scores }
}

/// Splits `num_people` into `num_groups` sizes that differ by at most one, larger sizes first.
fn balanced_sizes(num_people: usize, num_groups: usize) -> Vec<usize> {
    if num_groups == 0 {
        return vec![];
    }
    let base = num_people / num_groups;
    let extra = num_people % num_groups;
    (0..num_groups)
        .map(|idx| if idx < extra { base + 1 } else { base })
        .collect()
}

fn fill_in_order(order: &[PersonId], sizes: &[usize]) -> Vec<GroupInternal> {
    let mut res: Vec<GroupInternal> = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for &size in sizes.iter() {
        res.push(GroupInternal {
            members: order[start..start + size].to_vec(),
            capacity: size,
        });
        start += size;
    }
    res
}

fn allocate_chunks(num_people: usize, group_size: usize) -> Vec<GroupInternal> {
    let order: Vec<PersonId> = (0..num_people).map(PersonId).collect();
    order
        .chunks(group_size)
        .map(|chunk| GroupInternal {
            members: chunk.to_vec(),
            capacity: chunk.len(),
        })
        .collect()
}

fn preference_key(p: &Person) -> (String, String) {
    match &p.preferences {
        Some(prefs) => {
            let mut times = prefs.times.clone();
            times.sort();
            (times.join(","), prefs.mode.clone())
        }
        None => (String::new(), String::new()),
    }
}

// Students sharing meeting times and mode end up next to each other, then the
// sorted list is cut into groups of the desired size or one less.
fn allocate_by_preference(people: &[Person], group_size: usize) -> Vec<GroupInternal> {
    let mut order: Vec<(PersonId, (String, String))> = people
        .iter()
        .enumerate()
        .map(|(idx, p)| (PersonId(idx), preference_key(p)))
        .collect();
    order.sort_by(|a, b| a.1.cmp(&b.1));
    debug!("allocate_by_preference: sorted order: {:?}", order);

    let num_groups = (people.len() + group_size - 1) / group_size;
    let sizes = balanced_sizes(people.len(), num_groups);
    let order: Vec<PersonId> = order.into_iter().map(|(pid, _)| pid).collect();
    fill_in_order(&order, &sizes)
}

fn allocate_greedy(
    people: &[Person],
    table: &PairTable,
    min_size: usize,
    max_size: usize,
) -> Result<Vec<GroupInternal>, GroupingErrors> {
    let num_people = people.len();
    let num_groups = (num_people + max_size - 1) / max_size;
    if num_groups * min_size > num_people {
        return Err(GroupingErrors::InfeasibleGroupBounds {
            people: num_people,
            min: min_size as u32,
            max: max_size as u32,
        });
    }
    let sizes = balanced_sizes(num_people, num_groups);
    debug!("allocate_greedy: group sizes: {:?}", sizes);
    let mut groups: Vec<GroupInternal> = sizes.into_iter().map(GroupInternal::new).collect();

    let mut sorted_pairs: Vec<(PersonId, PersonId, f64)> = Vec::new();
    for i in 0..num_people {
        for j in (i + 1)..num_people {
            sorted_pairs.push((PersonId(i), PersonId(j), table.score(PersonId(i), PersonId(j))));
        }
    }
    // Stable sort: among equal scores, the lower indexes come first.
    sorted_pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    let mut assigned = vec![false; num_people];
    for (p1, p2, score) in sorted_pairs.iter() {
        if assigned[p1.0] || assigned[p2.0] {
            continue;
        }
        if let Some(group) = groups.iter_mut().find(|g| g.room() >= 2) {
            debug!(
                "allocate_greedy: pairing {:?} and {:?} (PCS {:.4})",
                p1, p2, score
            );
            group.add_member(*p1, people)?;
            group.add_member(*p2, people)?;
            assigned[p1.0] = true;
            assigned[p2.0] = true;
        }
    }

    // The remaining people go where there is the most room left.
    for (idx, is_assigned) in assigned.iter().enumerate() {
        if *is_assigned {
            continue;
        }
        let best = groups
            .iter_mut()
            .enumerate()
            .max_by_key(|(gidx, g)| (g.room(), std::cmp::Reverse(*gidx)))
            .map(|(_, g)| g)
            .ok_or(GroupingErrors::GroupFull)?;
        best.add_member(PersonId(idx), people)?;
    }
    Ok(groups)
}

fn cohort_gcs_variance(groups: &[GroupInternal], table: &PairTable) -> f64 {
    if groups.len() < 2 {
        return 0.0;
    }
    let scores: Vec<f64> = groups
        .iter()
        .map(|g| g.gcs(table).unwrap_or(0.0))
        .collect();
    variance(&scores)
}

fn swap_members(
    groups: &mut [GroupInternal],
    (g1, p1): (usize, PersonId),
    (g2, p2): (usize, PersonId),
    people: &[Person],
) -> Result<(), GroupingErrors> {
    groups[g1].remove_member(p1, people)?;
    groups[g2].remove_member(p2, people)?;
    groups[g1].add_member(p2, people)?;
    groups[g2].add_member(p1, people)?;
    Ok(())
}

// Simulated annealing over member swaps. The objective is the variance of the
// group compatibility scores: the groups should be equally well matched.
fn allocate_annealing(
    initial: Vec<GroupInternal>,
    people: &[Person],
    table: &PairTable,
    schedule: &AnnealingSchedule,
    seed: u64,
) -> Result<Vec<GroupInternal>, GroupingErrors> {
    let mut groups = initial;
    if groups.len() < 2 {
        debug!("allocate_annealing: less than two groups, nothing to swap");
        return Ok(groups);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut temperature = schedule.initial_temperature;
    let mut current = cohort_gcs_variance(&groups, table);
    let mut num_steps: u32 = 0;

    while temperature > schedule.min_temperature {
        num_steps += 1;
        let g1 = rng.gen_range(0..groups.len());
        let mut g2 = rng.gen_range(0..groups.len() - 1);
        if g2 >= g1 {
            g2 += 1;
        }
        if !groups[g1].members.is_empty() && !groups[g2].members.is_empty() {
            let p1 = groups[g1].members[rng.gen_range(0..groups[g1].members.len())];
            let p2 = groups[g2].members[rng.gen_range(0..groups[g2].members.len())];
            swap_members(&mut groups, (g1, p1), (g2, p2), people)?;

            let candidate = cohort_gcs_variance(&groups, table);
            if candidate < current {
                current = candidate;
            } else if ((current - candidate) / temperature).exp() < rng.gen::<f64>() {
                swap_members(&mut groups, (g1, p2), (g2, p1), people)?;
            } else {
                current = candidate;
            }
        }
        temperature *= schedule.cooling_rate;
    }
    debug!(
        "allocate_annealing: {} steps, final GCS variance: {:.6}",
        num_steps, current
    );
    Ok(groups)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / (values.len() as f64)
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() as f64)
}

// The most frequent value. Ties go to the value seen first.
fn dominant<'a, I>(values: I) -> Option<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values.filter(|v| !v.is_empty()) {
        if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == v) {
            entry.1 += 1;
        } else {
            counts.push((v, 1));
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (s, c) in counts {
        match best {
            Some((_, best_count)) if best_count >= c => {}
            _ => best = Some((s, c)),
        }
    }
    best.map(|(s, _)| s.to_string())
}

fn to_pair_stats(pair: Option<&(PersonId, PersonId, f64)>, people: &[Person]) -> Option<PairStats> {
    pair.map(|(p1, p2, score)| PairStats {
        first: people[p1.0].name.clone(),
        second: people[p2.0].name.clone(),
        score: *score,
    })
}

fn group_to_stats(
    idx: usize,
    group: &GroupInternal,
    people: &[Person],
    table: &PairTable,
) -> GroupStats {
    let pairs = group.pairs(table);
    let scores: Vec<f64> = pairs.iter().map(|p| p.2).collect();

    let mut most: Option<&(PersonId, PersonId, f64)> = None;
    let mut least: Option<&(PersonId, PersonId, f64)> = None;
    for p in pairs.iter() {
        if most.map(|m| p.2 > m.2).unwrap_or(true) {
            most = Some(p);
        }
        if least.map(|l| p.2 < l.2).unwrap_or(true) {
            least = Some(p);
        }
    }

    let members: Vec<&Person> = group.members.iter().map(|pid| &people[pid.0]).collect();
    let dominant_time = dominant(
        members
            .iter()
            .filter_map(|p| p.preferences.as_ref())
            .flat_map(|prefs| prefs.times.iter().map(|t| t.as_str())),
    );
    let dominant_mode = dominant(
        members
            .iter()
            .filter_map(|p| p.preferences.as_ref())
            .map(|prefs| prefs.mode.as_str()),
    );

    GroupStats {
        name: format!("Group {}", idx + 1),
        members: members.iter().map(|p| p.name.clone()).collect(),
        sids: members.iter().map(|p| p.sid.clone()).collect(),
        gcs: group.gcs(table),
        pcs_variance: variance(&scores),
        most_compatible: to_pair_stats(most, people),
        least_compatible: to_pair_stats(least, people),
        dominant_time,
        dominant_mode,
    }
}

fn groups_to_result(groups: &[GroupInternal], people: &[Person], table: &PairTable) -> GroupingResult {
    let stats: Vec<GroupStats> = groups
        .iter()
        .enumerate()
        .map(|(idx, g)| group_to_stats(idx, g, people, table))
        .collect();
    let gcs_values: Vec<f64> = stats.iter().map(|g| g.gcs.unwrap_or(0.0)).collect();
    GroupingResult {
        gcs_mean: mean(&gcs_values),
        gcs_variance: cohort_gcs_variance(groups, table),
        groups: stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn mode_attribute() -> Attribute {
        Attribute::new(
            "Mode",
            "Preferred way of meeting",
            &["Online".to_string(), "In person".to_string()],
            &[vec![1.0, 0.2], vec![0.2, 1.0]],
            1.0,
        )
        .unwrap()
    }

    fn person(name: &str, mode: &str, flexibility: u8) -> Person {
        let attr = mode_attribute();
        let mut p = Person::new(name, &format!("sid-{}", name));
        p.update_selection(&attr, mode).unwrap();
        p.update_flexibility(&attr, flexibility).unwrap();
        p
    }

    fn student(name: &str, times: &[&str], mode: &str) -> Person {
        let mut p = Person::new(name, name);
        p.preferences = Some(StudyPreferences {
            times: times.iter().map(|s| s.to_string()).collect(),
            mode: mode.to_string(),
        });
        p
    }

    fn rules(strategy: Strategy) -> GroupingRules {
        GroupingRules {
            strategy,
            ..GroupingRules::DEFAULT_RULES
        }
    }

    fn plain_people(n: usize) -> Vec<Person> {
        (0..n)
            .map(|i| Person::new(&format!("P{}", i), &i.to_string()))
            .collect()
    }

    fn sizes(res: &GroupingResult) -> Vec<usize> {
        res.groups.iter().map(|g| g.members.len()).collect()
    }

    fn all_members(res: &GroupingResult) -> Vec<String> {
        let mut names: Vec<String> = res
            .groups
            .iter()
            .flat_map(|g| g.members.clone())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn balanced_sizes_differ_by_at_most_one() {
        assert_eq!(balanced_sizes(11, 3), vec![4, 4, 3]);
        assert_eq!(balanced_sizes(10, 2), vec![5, 5]);
        assert_eq!(balanced_sizes(7, 2), vec![4, 3]);
        assert_eq!(balanced_sizes(3, 0), Vec::<usize>::new());
    }

    #[test]
    fn pair_score_is_damped_by_flexibility() {
        let attrs = vec![mode_attribute()];
        let people = vec![person("A", "Online", 1), person("B", "Online", 4)];
        let checked = checks(&people, &attrs).unwrap();
        // 1.0 * (1 - 4/10) * weight 1.0
        assert!(close(pair_score(&checked[0], &checked[1], &attrs, true), 0.6));
        assert!(close(pair_score(&checked[0], &checked[1], &attrs, false), 1.0));
    }

    #[test]
    fn full_flexibility_cancels_the_score() {
        let attrs = vec![mode_attribute()];
        let mut people = vec![Person::new("A", "1"), Person::new("B", "2")];
        for p in people.iter_mut() {
            p.update_selection(&attrs[0], "Online").unwrap();
        }
        let checked = checks(&people, &attrs).unwrap();
        assert!(close(pair_score(&checked[0], &checked[1], &attrs, true), 0.0));
    }

    #[test]
    fn missing_selection_is_reported() {
        init();
        let attrs = vec![mode_attribute()];
        let people = vec![person("A", "Online", 1), Person::new("B", "2")];
        let res = run_grouping(&people, &attrs, &rules(Strategy::Chunk));
        assert_eq!(
            res,
            Err(GroupingErrors::MissingSelection {
                person: "B".to_string(),
                attribute: "Mode".to_string()
            })
        );
    }

    #[test]
    fn duplicate_attributes_are_rejected() {
        let attrs = vec![mode_attribute(), mode_attribute()];
        let people = vec![person("A", "Online", 1)];
        let res = run_grouping(&people, &attrs, &rules(Strategy::Chunk));
        assert!(matches!(
            res,
            Err(GroupingErrors::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn empty_cohort() {
        let res = run_grouping(&[], &[], &rules(Strategy::Greedy));
        assert_eq!(res, Err(GroupingErrors::EmptyCohort));
    }

    #[test]
    fn chunks_keep_input_order() {
        init();
        let mut r = rules(Strategy::Chunk);
        r.group_size = 3;
        let res = run_grouping(&plain_people(7), &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![3, 3, 1]);
        assert_eq!(res.groups[0].members, vec!["P0", "P1", "P2"]);
        assert_eq!(res.groups[2].members, vec!["P6"]);
        assert_eq!(res.groups[2].name, "Group 3");
        assert_eq!(res.groups[2].gcs, None);
        assert_eq!(res.groups[0].gcs, Some(0.0));
    }

    #[test]
    fn preference_sorts_by_times_then_mode() {
        init();
        let people = vec![
            student("P1", &["Tue", "Mon"], "Online"),
            student("P2", &["Mon"], "Online"),
            student("P3", &["Mon", "Tue"], "In person"),
            student("P4", &["Wed"], "Online"),
            student("P5", &["Mon"], "In person"),
        ];
        let mut r = rules(Strategy::Preference);
        r.group_size = 2;
        let res = run_grouping(&people, &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![2, 2, 1]);
        assert_eq!(res.groups[0].members, vec!["P5", "P2"]);
        assert_eq!(res.groups[1].members, vec!["P3", "P1"]);
        assert_eq!(res.groups[2].members, vec!["P4"]);
        // Mon and Tue are both listed twice: the first one seen wins.
        assert_eq!(res.groups[1].dominant_time, Some("Mon".to_string()));
        assert_eq!(res.groups[1].dominant_mode, Some("In person".to_string()));
        assert_eq!(res.groups[2].dominant_mode, Some("Online".to_string()));
    }

    #[test]
    fn preference_never_drops_students() {
        let people: Vec<Person> = (0..11)
            .map(|i| student(&format!("S{:02}", i), &["Mon"], "Online"))
            .collect();
        let mut r = rules(Strategy::Preference);
        r.group_size = 5;
        let res = run_grouping(&people, &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![4, 4, 3]);
        assert_eq!(all_members(&res).len(), 11);
    }

    #[test]
    fn greedy_pairs_the_most_compatible_first() {
        init();
        let attrs = vec![mode_attribute()];
        let people = vec![
            person("A", "Online", 1),
            person("B", "In person", 1),
            person("C", "Online", 1),
            person("D", "In person", 1),
        ];
        let mut r = rules(Strategy::Greedy);
        r.min_group_size = 2;
        r.max_group_size = 2;
        let res = run_grouping(&people, &attrs, &r).unwrap();
        assert_eq!(res.groups[0].members, vec!["A", "C"]);
        assert_eq!(res.groups[1].members, vec!["B", "D"]);
        assert!(close(res.groups[0].gcs.unwrap(), 0.9));
        assert!(close(res.gcs_mean, 0.9));
        assert!(close(res.gcs_variance, 0.0));
        let most = res.groups[0].most_compatible.clone().unwrap();
        assert_eq!((most.first.as_str(), most.second.as_str()), ("A", "C"));
    }

    #[test]
    fn greedy_respects_bounds() {
        let mut r = rules(Strategy::Greedy);
        r.min_group_size = 3;
        r.max_group_size = 5;
        let res = run_grouping(&plain_people(10), &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![5, 5]);
        let res = run_grouping(&plain_people(7), &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![4, 3]);
        assert_eq!(all_members(&res).len(), 7);
    }

    #[test]
    fn greedy_infeasible_bounds() {
        let mut r = rules(Strategy::Greedy);
        r.min_group_size = 4;
        r.max_group_size = 5;
        let res = run_grouping(&plain_people(11), &[], &r);
        assert_eq!(
            res,
            Err(GroupingErrors::InfeasibleGroupBounds {
                people: 11,
                min: 4,
                max: 5
            })
        );
    }

    #[test]
    fn annealing_keeps_sizes_and_is_reproducible() {
        init();
        let attrs = vec![mode_attribute()];
        let people = vec![
            person("A", "Online", 1),
            person("B", "In person", 2),
            person("C", "Online", 3),
            person("D", "In person", 1),
            person("E", "Online", 5),
            person("F", "In person", 7),
        ];
        let mut r = rules(Strategy::Annealing);
        r.min_group_size = 2;
        r.max_group_size = 2;
        r.seed = 7;
        let res = run_grouping(&people, &attrs, &r).unwrap();
        assert_eq!(sizes(&res), vec![2, 2, 2]);
        assert_eq!(all_members(&res), vec!["A", "B", "C", "D", "E", "F"]);
        let again = run_grouping(&people, &attrs, &r).unwrap();
        assert_eq!(res, again);
    }

    #[test]
    fn annealing_with_a_single_group_is_greedy() {
        let mut r = rules(Strategy::Annealing);
        r.min_group_size = 2;
        r.max_group_size = 5;
        let res = run_grouping(&plain_people(4), &[], &r).unwrap();
        assert_eq!(sizes(&res), vec![4]);
    }

    #[test]
    fn group_membership_invariants() {
        let people = plain_people(3);
        let mut g = GroupInternal::new(2);
        g.add_member(PersonId(0), &people).unwrap();
        assert_eq!(
            g.add_member(PersonId(0), &people),
            Err(GroupingErrors::DuplicateMember {
                person: "P0".to_string()
            })
        );
        g.add_member(PersonId(1), &people).unwrap();
        assert_eq!(
            g.add_member(PersonId(2), &people),
            Err(GroupingErrors::GroupFull)
        );
        assert_eq!(
            g.remove_member(PersonId(2), &people),
            Err(GroupingErrors::NotAMember {
                person: "P2".to_string()
            })
        );
        g.remove_member(PersonId(0), &people).unwrap();
        assert_eq!(g.members, vec![PersonId(1)]);
    }

    #[test]
    fn dominant_prefers_first_seen_on_ties() {
        assert_eq!(
            dominant(["b", "a", "a", "b"].into_iter()),
            Some("b".to_string())
        );
        assert_eq!(dominant(["", "a"].into_iter()), Some("a".to_string()));
        assert_eq!(dominant(std::iter::empty()), None);
    }

    #[test]
    fn variance_is_population_variance() {
        assert!(close(variance(&[1.0, 3.0]), 1.0));
        assert!(close(variance(&[]), 0.0));
    }
}
