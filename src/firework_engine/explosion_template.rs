//! Modèles d'explosion et paquet d'assets du spectacle.
//!
//! Un `ExplosionTemplate` est un maillage triangulé dont la surface sert de
//! source aux positions initiales des particules d'explosion : le nuage prend
//! la silhouette du modèle (cœur, sphère, anneau, texte...).
//!
//! L'`AssetBundle` regroupe les modèles prêts à l'emploi, leurs poids de tirage
//! et la liste des maillages qui reçoivent les ombres des fusées. Il est
//! construit une fois pour toutes, avant la création du `Fleet`.

use anyhow::{bail, ensure};
use glam::{Affine3A, Vec3};
use log::info;
use rand::Rng;
use std::f32::consts::{PI, TAU};
use std::rc::Rc;

use crate::scene_engine::types::MeshHandle;

/// Maillage source d'une explosion.
#[derive(Debug, Clone)]
pub struct ExplosionTemplate {
    name: String,
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    /// Aires cumulées des triangles, pour un tirage proportionnel à la surface
    cumulative_areas: Vec<f32>,
}

impl ExplosionTemplate {
    /// Construit un modèle à partir d'une liste de triangles indexés.
    ///
    /// Échoue si un indice sort du tableau de sommets ou si la surface est nulle.
    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        ensure!(!triangles.is_empty(), "template '{}' has no triangle", name);

        let mut cumulative_areas = Vec::with_capacity(triangles.len());
        let mut total = 0.0;
        for tri in &triangles {
            let [a, b, c] = tri.map(|i| vertices.get(i as usize).copied());
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                bail!(
                    "template '{}': triangle {:?} references a missing vertex ({} vertices)",
                    name,
                    tri,
                    vertices.len()
                );
            };
            total += 0.5 * (b - a).cross(c - a).length();
            cumulative_areas.push(total);
        }
        ensure!(
            total > f32::EPSILON,
            "template '{}' has a degenerate (zero area) surface",
            name
        );

        info!(
            "ExplosionTemplate: '{}' ({} vertices, {} triangles, area {:.3})",
            name,
            vertices.len(),
            triangles.len(),
            total
        );

        Ok(Self {
            name,
            vertices,
            triangles,
            cumulative_areas,
        })
    }

    /// Sphère UV centrée sur l'origine.
    pub fn sphere(
        name: impl Into<String>,
        radius: f32,
        rings: u32,
        segments: u32,
    ) -> anyhow::Result<Self> {
        let (rings, segments) = (rings.max(2), segments.max(3));
        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for i in 0..=rings {
            let theta = PI * i as f32 / rings as f32;
            for j in 0..=segments {
                let phi = TAU * j as f32 / segments as f32;
                vertices.push(Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                ) * radius);
            }
        }

        let stride = segments + 1;
        let mut triangles = Vec::with_capacity((rings * segments * 2) as usize);
        for i in 0..rings {
            for j in 0..segments {
                let a = i * stride + j;
                let b = a + stride;
                triangles.push([a, b, a + 1]);
                triangles.push([a + 1, b, b + 1]);
            }
        }
        Self::from_triangles(name, vertices, triangles)
    }

    /// Anneau plat dans le plan XY.
    pub fn ring(
        name: impl Into<String>,
        inner_radius: f32,
        outer_radius: f32,
        segments: u32,
    ) -> anyhow::Result<Self> {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(2 * segments as usize);
        for j in 0..segments {
            let (sin, cos) = (TAU * j as f32 / segments as f32).sin_cos();
            vertices.push(Vec3::new(cos, sin, 0.0) * inner_radius);
            vertices.push(Vec3::new(cos, sin, 0.0) * outer_radius);
        }

        let mut triangles = Vec::with_capacity(2 * segments as usize);
        for j in 0..segments {
            let (inner, outer) = (2 * j, 2 * j + 1);
            let (next_inner, next_outer) = (2 * ((j + 1) % segments), 2 * ((j + 1) % segments) + 1);
            triangles.push([inner, outer, next_outer]);
            triangles.push([inner, next_outer, next_inner]);
        }
        Self::from_triangles(name, vertices, triangles)
    }

    /// Cœur plat dans le plan XY, de largeur ~`size`.
    ///
    /// Contour paramétrique classique, triangulé en éventail depuis l'origine.
    pub fn heart(name: impl Into<String>, size: f32, segments: u32) -> anyhow::Result<Self> {
        let segments = segments.max(8);
        let scale = size / 32.0;
        let mut vertices = Vec::with_capacity(segments as usize + 1);
        vertices.push(Vec3::ZERO);
        for k in 0..segments {
            let t = TAU * k as f32 / segments as f32;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            vertices.push(Vec3::new(x, y, 0.0) * scale);
        }

        let triangles = (0..segments)
            .map(|k| [0, 1 + k, 1 + (k + 1) % segments])
            .collect();
        Self::from_triangles(name, vertices, triangles)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn surface_area(&self) -> f32 {
        self.cumulative_areas.last().copied().unwrap_or(0.0)
    }

    /// Tire `count` points uniformément sur la surface, puis les place dans
    /// l'espace monde avec `placement`.
    ///
    /// # Algorithme
    /// 1. Choix d'un triangle proportionnellement à son aire (recherche
    ///    dichotomique dans les aires cumulées)
    /// 2. Point uniforme dans le triangle (coordonnées barycentriques, astuce `sqrt`)
    pub fn sample_surface(
        &self,
        count: usize,
        placement: Affine3A,
        rng: &mut impl Rng,
    ) -> Vec<Vec3> {
        (0..count)
            .map(|_| placement.transform_point3(self.sample_point(rng)))
            .collect()
    }

    fn sample_point(&self, rng: &mut impl Rng) -> Vec3 {
        let target = rng.random_range(0.0..self.surface_area());
        let idx = self
            .cumulative_areas
            .partition_point(|&area| area <= target)
            .min(self.triangles.len() - 1);
        let [a, b, c] = self.triangles[idx].map(|i| self.vertices[i as usize]);

        let su = rng.random::<f32>().sqrt();
        let v = rng.random::<f32>();
        a * (1.0 - su) + b * (su * (1.0 - v)) + c * (su * v)
    }
}

/// Modèles d'explosion chargés + maillages receveurs d'ombres.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    templates: Vec<(Rc<ExplosionTemplate>, f32)>,
    total_weight: f32,
    shadow_casters: Rc<[MeshHandle]>,
}

impl AssetBundle {
    pub fn new(shadow_casters: Vec<MeshHandle>) -> Self {
        Self {
            templates: Vec::new(),
            total_weight: 0.0,
            shadow_casters: shadow_casters.into(),
        }
    }

    /// Paquet par défaut du spectacle : cœurs (majoritaires), sphères et anneaux.
    pub fn mothers_day(shadow_casters: Vec<MeshHandle>) -> anyhow::Result<Self> {
        let mut bundle = Self::new(shadow_casters);
        bundle.add_template(ExplosionTemplate::heart("heart", 3.0, 64)?, 2.0)?;
        bundle.add_template(ExplosionTemplate::sphere("sphere", 1.5, 12, 24)?, 1.0)?;
        bundle.add_template(ExplosionTemplate::ring("ring", 1.2, 1.5, 48)?, 1.0)?;
        Ok(bundle)
    }

    /// Ajoute un modèle avec un poids relatif (probabilité d'être tiré).
    pub fn add_template(&mut self, template: ExplosionTemplate, weight: f32) -> anyhow::Result<()> {
        ensure!(
            weight.is_finite() && weight > 0.0,
            "template '{}': weight must be finite and > 0, got {}",
            template.name(),
            weight
        );
        self.templates.push((Rc::new(template), weight));
        self.total_weight = self.templates.iter().map(|(_, w)| w).sum();
        Ok(())
    }

    /// Modifie le poids d'un modèle existant.
    pub fn set_template_weight(&mut self, name: &str, new_weight: f32) -> anyhow::Result<()> {
        ensure!(
            new_weight.is_finite() && new_weight >= 0.0,
            "weight must be finite and >= 0, got {}",
            new_weight
        );
        let Some((_, weight)) = self.templates.iter_mut().find(|(t, _)| t.name() == name) else {
            bail!("template '{}' not found in asset bundle", name);
        };
        *weight = new_weight;
        self.total_weight = self.templates.iter().map(|(_, w)| w).sum();
        Ok(())
    }

    /// Vrai dès qu'au moins un modèle est disponible.
    pub fn is_ready(&self) -> bool {
        !self.templates.is_empty()
    }

    /// Somme des poids des modèles.
    pub fn total_weight(&self) -> f32 {
        self.total_weight
    }

    pub fn template(&self, name: &str) -> Option<Rc<ExplosionTemplate>> {
        self.templates
            .iter()
            .find(|(t, _)| t.name() == name)
            .map(|(t, _)| Rc::clone(t))
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|(t, _)| t.name())
    }

    /// Tire un modèle selon les poids, `None` si aucun poids n'est positif.
    pub fn sample_template(&self, rng: &mut impl Rng) -> Option<Rc<ExplosionTemplate>> {
        if self.total_weight <= 0.0 {
            return None;
        }
        let target = rng.random_range(0.0..self.total_weight);
        let mut current = 0.0;
        for (template, weight) in &self.templates {
            current += weight;
            if target < current {
                return Some(Rc::clone(template));
            }
        }
        // Arrondi flottant : on retombe sur le dernier modèle de poids non nul
        self.templates
            .iter()
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(t, _)| Rc::clone(t))
    }

    pub fn shadow_casters(&self) -> Rc<[MeshHandle]> {
        Rc::clone(&self.shadow_casters)
    }
}
